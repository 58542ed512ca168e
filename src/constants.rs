/// Default deadline for a single store call (5 seconds)
pub const DEFAULT_POINT_TIMEOUT_MS: u64 = 5_000;

/// Default deadline for a whole multi-step mutation (10 seconds)
pub const DEFAULT_MULTI_STEP_TIMEOUT_MS: u64 = 10_000;

/// Default token lifetime (72 hours)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 259_200;

/// Maximum user name length in characters
pub const MAX_NAME_CHARS: usize = 64;

/// Password length bounds in characters
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 128;

/// Maximum post content length in characters
pub const MAX_POST_CHARS: usize = 5_000;

/// Maximum avatar size in bytes (2MB)
pub const MAX_AVATAR_BYTES: usize = 2_097_152;

/// Request body limit; fits a base64-encoded maximum-size avatar
pub const MAX_REQUEST_BODY_BYTES: usize = 4 * 1024 * 1024;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_INVALID_ID: &str = "Invalid id format";

pub const ERR_EMPTY_CONTENT: &str = "content is required";

pub const ERR_CONTENT_TOO_LONG: &str = "content exceeds maximum length";

pub const ERR_INVALID_NAME: &str = "name must be between 1 and 64 characters";

pub const ERR_INVALID_PASSWORD: &str = "password must be between 8 and 128 characters";

pub const ERR_INVALID_AVATAR: &str = "avatar must be base64 data with an image content type";

pub const ERR_AVATAR_TOO_LARGE: &str = "avatar exceeds maximum allowed size";

/// Shown when a like landed but the liker's profile index could not be updated
pub const WARN_PROFILE_LAGGING: &str =
    "Post liked successfully, but there was an issue updating your profile. Please refresh.";
