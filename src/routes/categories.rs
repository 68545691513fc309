use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::{AppError, Result};
use crate::forms::{CategoryForm, FormErrors};
use crate::models::{Category, Taxonomy, User};
use crate::routes::page_context;
use crate::session::{flash, MaybeUser};
use crate::views::{category_page, CategorySection};
use crate::AppState;

/// Both category-creation forms
pub async fn categories(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    render(&state, jar, user, None).await
}

/// Create a category in the taxonomy named by the submitted form
pub async fn add_category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(mut form): Form<CategoryForm>,
) -> Result<Response> {
    let taxonomy = form
        .taxonomy()
        .ok_or_else(|| AppError::BadRequest(format!("Unknown taxonomy {}", form.taxonomy)))?;

    let errors = form.validate(&state.pool, taxonomy).await?;
    if !errors.is_empty() {
        let (jar, html) = render(&state, jar, user, Some((taxonomy, &form, &errors))).await?;
        return Ok((jar, html).into_response());
    }

    let category = Category::create(&state.pool, taxonomy, &form.label).await?;
    tracing::info!("{} '{}' added (id {})", taxonomy.title(), category.label, category.id);

    let jar = flash(jar, format!("Added category {}.", category.label));
    Ok((jar, Redirect::to("/category")).into_response())
}

/// Render the page, re-filling the form that failed validation (if any)
async fn render(
    state: &AppState,
    jar: CookieJar,
    user: Option<User>,
    failed: Option<(Taxonomy, &CategoryForm, &FormErrors)>,
) -> Result<(CookieJar, Html<String>)> {
    let no_errors = FormErrors::default();

    let mut existing = Vec::with_capacity(Taxonomy::ALL.len());
    for taxonomy in Taxonomy::ALL {
        existing.push(Category::list(&state.pool, taxonomy).await?);
    }

    let sections: Vec<CategorySection<'_>> = Taxonomy::ALL
        .iter()
        .zip(&existing)
        .map(|(&taxonomy, existing)| match failed {
            Some((failed_taxonomy, form, errors)) if failed_taxonomy == taxonomy => {
                CategorySection {
                    taxonomy,
                    label: &form.label,
                    errors,
                    existing,
                }
            }
            _ => CategorySection {
                taxonomy,
                label: "",
                errors: &no_errors,
                existing,
            },
        })
        .collect();

    let (jar, ctx) = page_context(jar, user);
    Ok((jar, Html(category_page(&ctx, &sections))))
}
