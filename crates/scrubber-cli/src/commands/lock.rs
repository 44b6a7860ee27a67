//! Password lock commands.
//!
//! Passwords may be passed with `--password`; otherwise they are read from
//! the terminal without echo.

use super::{Context, GlobalOptions, block_on};
use anyhow::{Result, anyhow};
use console::{Term, style};
use scrubber_engine::LockState;

fn read_password(given: Option<String>, prompt: &str) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let term = Term::stderr();
    if !term.is_term() {
        return Err(anyhow!("No password given and no terminal to ask on"));
    }
    term.write_str(prompt)?;
    Ok(term.read_secure_line()?)
}

fn describe(state: LockState) -> String {
    match state {
        LockState::Locked => style("locked").red().bold().to_string(),
        LockState::Unlocked => style("unlocked").green().bold().to_string(),
        LockState::NoPasswordSet => style("no password set").dim().to_string(),
    }
}

/// Configure the first password; locks immediately
pub fn set_password(
    options: &GlobalOptions,
    password: Option<String>,
    hint: Option<String>,
) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        let password = read_password(password, "New password: ")?;
        let state = ctx
            .app
            .lock
            .set_password(&password, hint.as_deref())
            .await?;
        ctx.emit(&state, || {
            println!("{} Password set, scrubber is now {}", style("✓").green(), describe(state));
        })
    })
}

pub fn change_password(
    options: &GlobalOptions,
    old: Option<String>,
    new: Option<String>,
    hint: Option<String>,
) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        let old = read_password(old, "Current password: ")?;
        let new = read_password(new, "New password: ")?;
        ctx.app
            .lock
            .change_password(&old, &new, hint.as_deref())
            .await?;
        ctx.emit(&serde_json::json!({ "changed": true }), || {
            println!("{} Password changed", style("✓").green());
        })
    })
}

pub fn unlock(options: &GlobalOptions, password: Option<String>) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        let attempt = read_password(password, "Password: ")?;
        let state = ctx.app.lock.unlock(&attempt).await?;
        ctx.emit(&state, || println!("scrubber is {}", describe(state)))
    })
}

pub fn lock_now(options: &GlobalOptions) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        let state = ctx.app.lock.lock_now().await?;
        ctx.emit(&state, || println!("scrubber is {}", describe(state)))
    })
}

/// Show the lock state after applying the idle check
pub fn status(options: &GlobalOptions) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        let state = ctx.app.lock.check_on_open().await?;
        let timeout = ctx.app.lock.lock_timeout().await?;
        ctx.emit(
            &serde_json::json!({ "state": state, "lockTime": timeout }),
            || {
                println!("scrubber is {}", describe(state));
                println!("Idle lock after {} second(s)", timeout);
            },
        )
    })
}

pub fn hint(options: &GlobalOptions) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        let hint = ctx.app.lock.password_hint().await?;
        ctx.emit(&serde_json::json!({ "hint": hint }), || match &hint {
            Some(hint) => println!("Hint: {}", hint),
            None => println!("No hint was set"),
        })
    })
}

/// Show or set the idle lock timeout in seconds
pub fn timeout(options: &GlobalOptions, secs: Option<u64>) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        if let Some(secs) = secs {
            ctx.ensure_unlocked().await?;
            ctx.app.lock.set_lock_timeout(secs).await?;
        }
        let timeout = ctx.app.lock.lock_timeout().await?;
        ctx.emit(&serde_json::json!({ "lockTime": timeout }), || {
            println!("Idle lock after {} second(s)", timeout);
        })
    })
}
