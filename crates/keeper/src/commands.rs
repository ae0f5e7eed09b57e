// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Every command that changes the vault opens it, applies one change and
//! closes it again. Read-only commands drop the session without writing,
//! which zeroes the keys.

use colored::Colorize;
use keeper_config::KeeperConfig;
use keeper_core::KeeperError;
use keeper_vault::{
    GeneratorOptions, KdfParams, VaultPaths, VaultSession, background, generate_password, prompt,
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::warn;

use crate::Commands;
use crate::busy::Spinner;

/// Per-invocation settings shared by all commands.
pub struct Context<'a> {
    config: &'a KeeperConfig,
    spinner: Spinner,
    use_color: bool,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a KeeperConfig, interactive: bool) -> Self {
        Self {
            config,
            spinner: Spinner::new(interactive),
            use_color: interactive,
        }
    }

    fn paths(&self) -> VaultPaths {
        VaultPaths::from(&self.config.vault)
    }

    fn params(&self) -> KdfParams {
        KdfParams::from(&self.config.vault)
    }

    fn generator(&self) -> GeneratorOptions {
        GeneratorOptions::from(&self.config.generator)
    }

    fn site(&self, site: &str) -> String {
        if self.use_color {
            site.bold().to_string()
        } else {
            site.to_string()
        }
    }
}

/// A failed command, remembering whether it failed while opening the vault.
///
/// Only opening failures map to the "cannot open" exit status; a save that
/// fails on malformed data is an ordinary failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CommandError {
    #[source]
    pub error: KeeperError,
    pub opening: bool,
}

impl CommandError {
    fn opening(error: KeeperError) -> Self {
        Self {
            error,
            opening: true,
        }
    }

    pub fn is_cannot_open(&self) -> bool {
        self.opening && self.error.is_cannot_open()
    }
}

impl From<KeeperError> for CommandError {
    fn from(error: KeeperError) -> Self {
        Self {
            error,
            opening: false,
        }
    }
}

pub async fn run(command: Commands, ctx: &Context<'_>) -> Result<(), CommandError> {
    match command {
        Commands::Init => init(ctx).await,
        Commands::List => list(ctx).await,
        Commands::Add {
            site,
            account,
            generate,
        } => add(ctx, site, account, generate).await,
        Commands::Show { site, account } => show(ctx, &site, account.as_deref()).await,
        Commands::SetPassword {
            site,
            account,
            generate,
        } => set_password(ctx, &site, account.as_deref(), generate).await,
        Commands::Rename {
            site,
            account,
            new_site,
            new_account,
        } => rename(ctx, &site, account.as_deref(), new_site, new_account).await,
        Commands::Remove { site, account } => remove(ctx, &site, account.as_deref()).await,
        Commands::Passwd => passwd(ctx).await,
        Commands::Config => show_config(ctx),
        Commands::Generate { length, symbols } => generate(ctx, length, symbols),
    }
}

fn no_vault(path: &std::path::Path) -> KeeperError {
    KeeperError::io(
        path,
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no vault here, run `keeper init` first",
        ),
    )
}

/// Open an existing vault, returning the session and the password that opened it.
async fn open_existing(ctx: &Context<'_>) -> Result<(VaultSession, SecretString), CommandError> {
    let paths = ctx.paths();
    if !paths.key_file.exists() {
        return Err(no_vault(&paths.key_file).into());
    }
    let password = prompt::get_master_password()?;
    let session = background::open_session(paths, password.clone(), ctx.params(), &ctx.spinner)
        .await
        .map_err(CommandError::opening)?;
    Ok((session, password))
}

async fn save(
    ctx: &Context<'_>,
    session: VaultSession,
    password: SecretString,
) -> Result<(), CommandError> {
    background::close_session(session, password, &ctx.spinner)
        .await
        .map_err(|failure| {
            if failure.session.is_some() {
                warn!("vault was not saved; changes from this command are lost");
            }
            CommandError::from(failure.error)
        })
}

/// A password for an entry, either generated or prompted for.
struct NewPassword {
    secret: SecretString,
    generated: bool,
}

impl NewPassword {
    fn obtain(
        ctx: &Context<'_>,
        site: &str,
        account: &str,
        generate: bool,
    ) -> Result<Self, KeeperError> {
        let secret = if generate {
            generate_password(&ctx.generator())?
        } else {
            prompt::get_entry_password(&format!("Password for {account}@{site} (empty for none)"))?
        };
        Ok(Self {
            secret,
            generated: generate,
        })
    }

    /// Generated passwords are printed once, after they are safely stored.
    /// Prompted ones never are.
    fn announce(&self) {
        if self.generated {
            println!("Generated password: {}", self.secret.expose_secret());
        }
    }
}

async fn init(ctx: &Context<'_>) -> Result<(), CommandError> {
    let paths = ctx.paths();
    if paths.key_file.exists() {
        return Err(KeeperError::io(
            &paths.key_file,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "a vault already exists"),
        )
        .into());
    }
    let password = prompt::get_master_password_with_confirm()?;
    let session =
        background::open_session(paths.clone(), password.clone(), ctx.params(), &ctx.spinner)
            .await
            .map_err(CommandError::opening)?;
    save(ctx, session, password).await?;
    println!(
        "Created vault\n  key file: {}\n  archive:  {}",
        paths.key_file.display(),
        paths.archive_file.display()
    );
    Ok(())
}

async fn list(ctx: &Context<'_>) -> Result<(), CommandError> {
    let (session, _password) = open_existing(ctx).await?;
    if session.is_empty() {
        println!("(no entries)");
        return Ok(());
    }
    for entry in session.sorted_view() {
        let marker = if entry.has_password() { "" } else { "  (no password)" };
        println!("{}\t{}{marker}", ctx.site(entry.site()), entry.account());
    }
    Ok(())
}

async fn add(
    ctx: &Context<'_>,
    site: String,
    account: String,
    generate: bool,
) -> Result<(), CommandError> {
    let (mut session, master) = open_existing(ctx).await?;
    if session.find(&site, Some(&account)).is_some() {
        warn!(%site, %account, "an entry for this site and account already exists");
    }
    let password = NewPassword::obtain(ctx, &site, &account, generate)?;
    session.add_entry(site.as_str(), account.as_str(), Some(&password.secret))?;
    save(ctx, session, master).await?;
    println!("Added {account}@{}", ctx.site(&site));
    password.announce();
    Ok(())
}

async fn show(ctx: &Context<'_>, site: &str, account: Option<&str>) -> Result<(), CommandError> {
    let (session, _master) = open_existing(ctx).await?;
    let index = session.require(site, account)?;
    let entry = &session.entries()[index];
    println!("site:     {}", ctx.site(entry.site()));
    println!("account:  {}", entry.account());
    match session.reveal_password(index)? {
        Some(password) => println!("password: {}", password.expose_secret()),
        None => println!("password: (none)"),
    }
    Ok(())
}

async fn set_password(
    ctx: &Context<'_>,
    site: &str,
    account: Option<&str>,
    generate: bool,
) -> Result<(), CommandError> {
    let (mut session, master) = open_existing(ctx).await?;
    let index = session.require(site, account)?;
    let account_name = session.entries()[index].account().to_string();
    let password = NewPassword::obtain(ctx, site, &account_name, generate)?;
    session.set_password(index, &password.secret)?;
    save(ctx, session, master).await?;
    println!("Updated password for {account_name}@{}", ctx.site(site));
    password.announce();
    Ok(())
}

async fn rename(
    ctx: &Context<'_>,
    site: &str,
    account: Option<&str>,
    new_site: Option<String>,
    new_account: Option<String>,
) -> Result<(), CommandError> {
    let (mut session, master) = open_existing(ctx).await?;
    let index = session.require(site, account)?;
    let current = &session.entries()[index];
    let new_site = new_site.unwrap_or_else(|| current.site().to_string());
    let new_account = new_account.unwrap_or_else(|| current.account().to_string());
    session.update_entry(index, new_site.as_str(), new_account.as_str())?;
    save(ctx, session, master).await?;
    println!("Renamed to {new_account}@{}", ctx.site(&new_site));
    Ok(())
}

async fn remove(ctx: &Context<'_>, site: &str, account: Option<&str>) -> Result<(), CommandError> {
    let (mut session, master) = open_existing(ctx).await?;
    let index = session.require(site, account)?;
    let removed = session.remove_entry(index)?;
    save(ctx, session, master).await?;
    println!("Removed {}@{}", removed.account(), ctx.site(removed.site()));
    Ok(())
}

async fn passwd(ctx: &Context<'_>) -> Result<(), CommandError> {
    let (session, _old) = open_existing(ctx).await?;
    let new_password = prompt::get_new_master_password()?;
    save(ctx, session, new_password).await?;
    println!("Master password changed");
    Ok(())
}

fn show_config(ctx: &Context<'_>) -> Result<(), CommandError> {
    let rendered = ctx
        .config
        .to_toml()
        .map_err(|e| KeeperError::Config(format!("failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}

fn generate(ctx: &Context<'_>, length: Option<usize>, symbols: bool) -> Result<(), CommandError> {
    let mut options = ctx.generator();
    if let Some(length) = length {
        options.length = length;
    }
    options.symbols |= symbols;
    println!("{}", generate_password(&options)?.expose_secret());
    Ok(())
}
