use std::{
    env,
    io::{self, Write},
};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use client::{ChatClient, Session, SessionState};
use rpassword::prompt_password;
use shared::config::ClientConfig;

/// Read instead of prompting when set, for scripted use.
const PASSWORD_ENV: &str = "CHATTERLY_PASSWORD";

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Sign in with email and password
    Login(LoginArgs),
    /// Create an account and sign in
    Signup(SignupArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,

    /// Display name; prompted for when omitted
    #[arg(long, short)]
    pub username: Option<String>,
}

pub async fn run(command: SessionCommand, config: ClientConfig) -> Result<()> {
    let mut client = ChatClient::from_config(config).context("failed to set up the client")?;
    client
        .restore()
        .context("failed to read the stored session")?;

    match command {
        SessionCommand::Login(args) => login(&client, args).await,
        SessionCommand::Signup(args) => signup(&client, args).await,
        SessionCommand::Logout => logout(&mut client).await,
        SessionCommand::Whoami => {
            whoami(&client);
            Ok(())
        }
    }
}

async fn login(client: &ChatClient, args: LoginArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = read_password()?;

    let session = client
        .login(&email, &password)
        .await
        .map_err(|err| anyhow::anyhow!("login failed: {}", err.user_message()))?;
    print_session_summary(&session);
    Ok(())
}

async fn signup(client: &ChatClient, args: SignupArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let username = match args.username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = read_password()?;

    let session = client
        .signup(&email, &password, &username)
        .await
        .map_err(|err| anyhow::anyhow!("signup failed: {}", err.user_message()))?;
    print_session_summary(&session);
    Ok(())
}

async fn logout(client: &mut ChatClient) -> Result<()> {
    if client.session().current().is_none() {
        println!("No active session.");
        return Ok(());
    }
    client
        .logout()
        .await
        .context("failed to remove the stored session")?;
    println!("Signed out.");
    Ok(())
}

fn whoami(client: &ChatClient) {
    match client.session().state() {
        SessionState::Authenticated(session) => print_session_summary(&session),
        SessionState::Anonymous | SessionState::Loading => println!("Not logged in."),
    }
}

fn read_password() -> Result<String> {
    let password = match env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => prompt_password("Password: ")?,
    };
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}

fn print_session_summary(session: &Session) {
    let user = &session.user;
    println!("Signed in as {} <{}>", user.username, user.email);
    println!("User id: {}", user.id);
}
