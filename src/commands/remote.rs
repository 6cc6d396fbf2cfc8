use anyhow::Result;
use owo_colors::OwoColorize;

use crate::session::Session;

pub async fn connect(session: &Session, provider: &str) -> Result<()> {
    let remote = session.remote(provider)?;

    println!("Connecting to {}...", provider);

    // The provider runs its own sign-in flow and keeps the credentials
    let account = remote.connect().await?;

    println!("\nConnected as: {}", account);
    if remote.account_identifier().is_none() {
        println!("\nAdd the account to your config.toml:");
        println!();
        println!("[remotes.{}]", provider);
        println!("{}_account = \"{}\"", provider, account);
    }
    println!();
    println!("Then run `remindcal refresh {}` to see its events.", provider);

    Ok(())
}

pub async fn disconnect(session: &mut Session, provider: &str) -> Result<()> {
    let remote = session.remote(provider)?;
    remote.disconnect().await?;
    session.store.disconnect_external(provider);
    println!("Disconnected {}", provider);
    println!(
        "{}",
        format!("Remove [remotes.{}] from config.toml to stop listing it", provider).dimmed()
    );
    Ok(())
}

pub async fn sign_out(session: &Session, provider: &str) -> Result<()> {
    let remote = session.remote(provider)?;
    remote.sign_out().await?;
    println!("Signed out of {}", provider);
    Ok(())
}
