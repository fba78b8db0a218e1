//! Setup for [poise::Framework]

use crate::commands;
use crate::serenity;
use crate::Config;
use crate::Data;
use crate::SupportError;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, SupportError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config))
        .build()
}

/// Configure options for the [Framework]
fn framework_options() -> poise::FrameworkOptions<Data, SupportError> {
    poise::FrameworkOptions {
        // Add commands to the framework
        commands: commands::list(),
        // Handle framework errors
        on_error: |e| crate::log::handle_framework_error(e),
        // Buttons, select menus and modals are routed here
        event_handler: |ctx, event, fw, data| {
            Box::pin(crate::lib::events::handle_event(ctx, event, fw, data))
        },
        // Log when commands start
        pre_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Started '{cmd_name}' command from {user}.")
            })
        },
        // Log when finishing commands
        post_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Finished '{cmd_name}' command from {user}.")
            })
        },
        ..Default::default()
    }
}

/// Construct future that runs on startup
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
) -> poise::BoxFuture<'a, Result<Data, SupportError>> {
    Box::pin(async move {
        // Register the commands
        let app_commands = poise::builtins::create_application_commands(&fw.options().commands);

        serenity::Command::set_global_commands(ctx, app_commands.clone()).await?;
        if let Some(dev_guild) = config.dev_guild() {
            // This is faster than global registers, useful for development.
            tracing::info!("Registering commands on dev guild.");
            dev_guild.set_commands(ctx, app_commands).await?;
        }

        let bot_name = &rdy.user.name;
        let guilds = rdy.guilds.len();
        tracing::info!("{bot_name} is ready! Connected to {guilds} servers.");

        Ok(Data::new(
            config.notify_list(fw),
            config.tickets().clone(),
            config.applications().clone(),
        ))
    })
}
