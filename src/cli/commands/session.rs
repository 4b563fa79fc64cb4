use clap::{Arg, ArgAction, Command};

pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long(ARG_SECRET_KEY)
                .help("Key used to sign status message cookies (at least 16 bytes)")
                .env("PORTIER_SECRET_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark cookies Secure (serve behind HTTPS)")
                .env("PORTIER_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
}
