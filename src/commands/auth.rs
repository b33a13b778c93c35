//! Account commands: register, login, logout, and email confirmation
//!
//! Login prints the session token; export it as `QUEUECHAT_SESSION_TOKEN`
//! so later invocations reuse the session.

use super::build_client;
use crate::api::UserProfile;
use crate::config::Config;
use crate::error::{QueuechatError, Result};
use colored::Colorize;
use regex::Regex;
use rustyline::DefaultEditor;

const MIN_PASSWORD_LENGTH: usize = 12;

/// Register a new account.
pub async fn register(
    config: &Config,
    email: &str,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    validate_email(email)?;
    if username.trim().is_empty() {
        return Err(QueuechatError::InvalidRequest("username cannot be empty".to_string()).into());
    }
    let password = resolve_password(password)?;
    validate_password(&password)?;

    let client = build_client(config)?;
    let user = client.register(email, username, &password).await?;

    println!("{} account {}", "Registered".green(), user.id);
    println!("Check {} for a confirmation PIN, then run `queuechat confirm-email <PIN>`.", email);
    Ok(())
}

/// Log in and print the session token.
pub async fn login(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    validate_email(email)?;
    let password = resolve_password(password)?;

    let client = build_client(config)?;
    let session = client.login(email, &password).await?;

    print_profile(&session.user);
    match session.session_token {
        Some(token) => {
            println!("\nTo reuse this session, run:");
            println!("  export QUEUECHAT_SESSION_TOKEN={}", token);
        }
        None => {
            tracing::warn!("Login succeeded but the backend did not set a session cookie");
        }
    }
    Ok(())
}

/// End the configured session.
pub async fn logout(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    client.logout().await?;
    println!("Logged out");
    Ok(())
}

/// Show the logged-in account.
pub async fn me(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let user = client.me().await?;
    print_profile(&user);
    Ok(())
}

/// Confirm the account email with a six-digit PIN.
pub async fn confirm_email(config: &Config, pin: &str) -> Result<()> {
    let pin = parse_pin(pin)?;
    let client = build_client(config)?;
    let user = client.confirm_email(pin).await?;

    if user.is_activated {
        println!("{}", "Email confirmed".green());
    } else {
        println!("{}", "PIN accepted, but the account is not activated yet".yellow());
    }
    Ok(())
}

/// Ask the backend to email a new confirmation PIN.
pub async fn new_key(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    client.request_new_key().await?;
    println!("A new PIN has been sent to your email");
    Ok(())
}

fn print_profile(user: &UserProfile) {
    println!("\nAccount {}", user.id);
    println!("Username:  {}", user.username.as_deref().unwrap_or("-"));
    println!("Email:     {}", user.email.as_deref().unwrap_or("-"));
    println!("Role:      {}", user.role);
    let activated = if user.is_activated {
        "yes".green()
    } else {
        "no".red()
    };
    println!("Activated: {}\n", activated);
}

fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let mut rl = DefaultEditor::new()?;
    Ok(rl.readline("Password: ")?)
}

fn validate_email(email: &str) -> std::result::Result<(), QueuechatError> {
    let re = Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$")
        .map_err(|e| QueuechatError::Config(e.to_string()))?;
    if re.is_match(email) {
        Ok(())
    } else {
        Err(QueuechatError::InvalidRequest(format!(
            "invalid email address: {}",
            email
        )))
    }
}

/// Checks length and character classes: lowercase, uppercase, digit, and
/// one non-word character.
fn validate_password(password: &str) -> std::result::Result<(), QueuechatError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(QueuechatError::InvalidRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let rules = [
        (password.chars().any(|c| c.is_ascii_lowercase()), "a lowercase letter"),
        (password.chars().any(|c| c.is_ascii_uppercase()), "an uppercase letter"),
        (password.chars().any(|c| c.is_ascii_digit()), "a digit"),
        (
            password.chars().any(|c| !c.is_alphanumeric() && c != '_'),
            "a special character",
        ),
    ];
    for (ok, what) in rules {
        if !ok {
            return Err(QueuechatError::InvalidRequest(format!(
                "password must contain {}",
                what
            )));
        }
    }
    Ok(())
}

fn parse_pin(pin: &str) -> std::result::Result<u32, QueuechatError> {
    let re = Regex::new(r"^\d{6}$").map_err(|e| QueuechatError::Config(e.to_string()))?;
    if !re.is_match(pin) {
        return Err(QueuechatError::InvalidRequest(
            "PIN must be exactly 6 digits".to_string(),
        ));
    }
    pin.parse()
        .map_err(|_| QueuechatError::InvalidRequest("PIN must be exactly 6 digits".to_string()))
}
