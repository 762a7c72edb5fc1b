use clap::{Parser, Subcommand};
use keygate_core::auth::jwt::DEFAULT_TOKEN_EXPIRY_SECS;
use keygate_core::auth::password::DEFAULT_BCRYPT_COST;

#[derive(Parser, Debug)]
#[command(name = "keygate", about = "Keygate password and token tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Hash a password with bcrypt and print the hash.
    HashPassword {
        password: String,

        /// bcrypt cost factor (4..=31).
        #[arg(long, default_value_t = DEFAULT_BCRYPT_COST)]
        cost: u32,
    },

    /// Check a password against a bcrypt hash.
    VerifyPassword { password: String, hash: String },

    /// Issue a signed token for a username and print it.
    IssueToken {
        subject: String,

        /// HMAC signing secret.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,

        /// Token lifetime in seconds.
        #[arg(long, default_value_t = DEFAULT_TOKEN_EXPIRY_SECS, allow_negative_numbers = true)]
        expiry_secs: i64,
    },

    /// Check that a token is validly signed, unexpired and issued for a username.
    VerifyToken {
        token: String,
        subject: String,

        /// HMAC signing secret.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },
}
