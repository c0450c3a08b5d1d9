//! Login, logout, email verification and session inspection.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use guestbook_core::gateway::ApiClient;
use guestbook_core::session::mask_token;

pub async fn login(client: &ApiClient, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let profile = client.login(email, &password).await?;
    let who = profile
        .name
        .or(profile.username)
        .or(profile.email)
        .unwrap_or_else(|| email.to_string());
    println!("Logged in as {who}");
    Ok(())
}

fn prompt_password() -> Result<String> {
    print!("Password: ");
    std::io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim().to_string())
}

pub fn logout(client: &ApiClient) -> Result<()> {
    if client.session().access_token().is_none() {
        println!("Not logged in");
        return Ok(());
    }
    client.logout()?;
    println!("Logged out");
    Ok(())
}

pub async fn verify_email(
    client: &ApiClient,
    email: &str,
    otp: Option<&str>,
    resend: bool,
) -> Result<()> {
    if resend {
        client.resend_otp(email).await?;
        println!("Verification code sent to {email}");
        return Ok(());
    }

    let Some(otp) = otp else {
        bail!("Provide --otp <code>, or --resend to request a new one");
    };
    client.verify_email(email, otp).await?;
    println!("Email verified");
    Ok(())
}

pub fn whoami(client: &ApiClient) -> Result<()> {
    let Some(token) = client.session().access_token() else {
        println!("Not logged in");
        return Ok(());
    };

    match client.current_user() {
        Some(profile) => {
            if let Some(name) = &profile.name {
                println!("Name:     {name}");
            }
            if let Some(username) = &profile.username {
                println!("Username: {username}");
            }
            if let Some(email) = &profile.email {
                println!("Email:    {email}");
            }
        }
        None => println!("Logged in (no profile stored)"),
    }
    println!("Token:    {}", mask_token(&token));
    Ok(())
}
