use crate::{
    cli::commands::upstream::Options,
    sso::{LoginFlow, ResponseEnvelope},
};
use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub username: Option<String>,
    pub captcha_path: PathBuf,
    pub upstream: Options,
}

/// Where the walkthrough reads answers from and reports progress to.
pub(crate) trait Prompter {
    fn text(&mut self, label: &str) -> Result<String>;
    fn secret(&mut self, label: &str) -> Result<SecretString>;
    fn show(&mut self, line: &str);
}

/// Interactive terminal; the SMS code is read without echo.
struct Terminal;

#[allow(clippy::ptr_arg)]
fn not_blank(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("A value is required")
    } else {
        Ok(())
    }
}

impl Prompter for Terminal {
    fn text(&mut self, label: &str) -> Result<String> {
        let value: String = tokio::task::block_in_place(|| {
            Input::<String>::new()
                .with_prompt(label)
                .validate_with(not_blank)
                .interact_text()
        })
        .with_context(|| format!("failed to read {label}"))?;
        Ok(value.trim().to_string())
    }

    fn secret(&mut self, label: &str) -> Result<SecretString> {
        let value = tokio::task::block_in_place(|| {
            Password::new()
                .with_prompt(label)
                .validate_with(not_blank)
                .interact()
        })
        .with_context(|| format!("failed to read {label}"))?;
        Ok(SecretString::from(value.trim().to_string()))
    }

    fn show(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Execute the interactive login action on the process terminal.
/// # Errors
/// Returns an error if any step of the flow fails or a prompt is aborted.
pub async fn execute(args: Args) -> Result<()> {
    run(args, &mut Terminal).await
}

/// Drive captcha, SMS, and login, asking `prompter` for each code.
pub(crate) async fn run<P: Prompter>(args: Args, prompter: &mut P) -> Result<()> {
    let client = args.upstream.client()?;

    let username = match args.username {
        Some(username) if !username.trim().is_empty() => username.trim().to_string(),
        _ => prompter.text("Username")?,
    };

    let mut flow = LoginFlow::new(client, username);

    let image = flow.fetch_captcha().await?;
    tokio::fs::write(&args.captcha_path, &image)
        .await
        .with_context(|| format!("failed to write {}", args.captcha_path.display()))?;
    info!("captcha saved to {}", args.captcha_path.display());
    prompter.show(&format!(
        "Captcha saved to {}",
        args.captcha_path.display()
    ));

    let vcode = prompter.text("Captcha code")?;
    let sms = flow.send_sms(&vcode).await?;
    debug!("sms request sent to {}", sms.url);
    prompter.show(&format!("SMS sent ({}): {}", sms.status, render(&sms.body)?));

    let sms_code = prompter.secret("SMS code")?;
    let login = flow.login(sms_code.expose_secret()).await?;
    prompter.show(&format!(
        "Login ({}): {}",
        login.status,
        render(&login.body)?
    ));

    Ok(())
}

fn render<T: Serialize>(body: &ResponseEnvelope<T>) -> Result<String> {
    serde_json::to_string(body).context("failed to render response body")
}
