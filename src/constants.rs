/// Maximum username length (matches the `user.username` column)
pub const MAX_USERNAME_LEN: usize = 64;

/// Maximum email length (matches the `user.email` column)
pub const MAX_EMAIL_LEN: usize = 120;

/// Maximum "about me" length
pub const MAX_ABOUT_ME_LEN: usize = 140;

/// Maximum game name length
pub const MAX_GAME_NAME_LEN: usize = 64;

/// Maximum category label length
pub const MAX_CATEGORY_LABEL_LEN: usize = 64;

/// Length of the random salt stored with each password hash
pub const PASSWORD_SALT_LEN: usize = 16;

/// Gravatar image size for profile pages
pub const AVATAR_SIZE: u32 = 128;

/// Value of the synthetic "not selected" category choice
pub const NO_CATEGORY: i64 = 0;

/// Label of the synthetic "not selected" category choice
pub const NO_CATEGORY_LABEL: &str = "N/A";

// =============================================================================
// Cookies
// =============================================================================

/// Cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "gamebase_session";

/// Cookie carrying pending flash messages
pub const FLASH_COOKIE: &str = "gamebase_flash";

// =============================================================================
// User-facing Messages
// =============================================================================

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_EMAIL: &str = "Invalid email address.";
pub const MSG_PASSWORDS_MUST_MATCH: &str = "Field must be equal to password.";
pub const MSG_DUPLICATE_USERNAME: &str = "Please use a different username.";
pub const MSG_DUPLICATE_EMAIL: &str = "Please use a different email address.";
pub const MSG_DUPLICATE_GAME: &str = "A game with that name already exists";
pub const MSG_DUPLICATE_CATEGORY: &str = "That category already exists";
pub const MSG_INVALID_CHOICE: &str = "Not a valid choice";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const MSG_SELECT_CATEGORY: &str = "Please select at least one category.";
pub const MSG_LOGIN_REQUIRED: &str = "Please log in to access this page.";
pub const MSG_REGISTERED: &str = "Congratulations, you are now a registered user!";
pub const MSG_GAME_ADDED: &str = "Thank you for adding a new game!";
pub const MSG_PROFILE_SAVED: &str = "Your changes have been saved.";
