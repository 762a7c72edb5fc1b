// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use chrono::Duration;
use clap::Parser;
use cli::{Cli, Commands};
use keygate_core::auth::jwt::token_lifetime;
use keygate_core::auth::{PasswordHasher, TokenIssuer};

mod cli;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match &args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::HashPassword { password, cost } => {
            let hash = PasswordHasher::new(*cost).hash(password)?;
            println!("{hash}");
        }
        Commands::VerifyPassword { password, hash } => {
            if !PasswordHasher::default().verify(password, hash) {
                return Err(Error::Custom("password does not match hash".into()));
            }
            println!("match");
        }
        Commands::IssueToken {
            subject,
            secret,
            expiry_secs,
        } => {
            let issuer = TokenIssuer::new(secret.as_bytes(), token_lifetime(*expiry_secs)?);
            let token = issuer.issue(subject)?;
            log::debug!("issued token for {subject}, expires in {expiry_secs}s");
            println!("{token}");
        }
        Commands::VerifyToken {
            token,
            subject,
            secret,
        } => {
            // Expiry is read from the token itself; the lifetime here is unused.
            let issuer = TokenIssuer::new(secret.as_bytes(), Duration::zero());
            if !issuer.verify(token, subject) {
                return Err(Error::Custom(format!(
                    "token is not valid for subject '{subject}'"
                )));
            }
            println!("valid");
        }
    }

    Ok(())
}
