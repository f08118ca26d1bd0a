pub const DEFAULT_CATEGORY: &str = "General";

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_EMAIL_LEN: usize = 5;

// bcrypt only looks at the first 72 bytes
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 72;

pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 1000;
