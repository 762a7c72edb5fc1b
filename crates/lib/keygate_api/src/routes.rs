//! Route paths served by the API.

pub const GET_AUTH_HEALTH: &str = "/api/auth/health";
pub const POST_AUTH_REGISTER: &str = "/api/auth/register";
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const GET_AUTH_ME: &str = "/api/auth/me";
