pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_ISSUER: &str = "issuer";
pub const ARG_SIGNING_SEED: &str = "signing-seed";
pub const ARG_CEREMONY: &str = "ceremony";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_CEREMONY_TTL: &str = "ceremony-ttl-seconds";
pub const ARG_ACCESS_TTL: &str = "access-ttl-seconds";
pub const ARG_REFRESH_TTL: &str = "refresh-ttl-seconds";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("vestibule")
        .about("Stateless authentication and registration ceremonies")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("VESTIBULE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ISSUER)
                .long(ARG_ISSUER)
                .help("Issuer claim for every signed token")
                .default_value("https://vestibule.dev")
                .env("VESTIBULE_ISSUER"),
        )
        .arg(
            Arg::new(ARG_SIGNING_SEED)
                .long(ARG_SIGNING_SEED)
                .help("Base64url-encoded 32-byte Ed25519 seed; a random key is generated when absent")
                .env("VESTIBULE_SIGNING_SEED"),
        )
        .arg(
            Arg::new(ARG_CEREMONY)
                .short('c')
                .long(ARG_CEREMONY)
                .help("Path to the ceremony definition JSON file")
                .long_help(
                    "Path to a JSON file holding the ceremony tree and its component \
                     providers: {\"ceremony\": <tree>, \"registration\": <tree, optional>, \
                     \"components\": {<id>: {\"prompt\": <kind>, \"secret\": <optional>}}}",
                )
                .env("VESTIBULE_CEREMONY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL allowed by CORS")
                .default_value("http://localhost:5173")
                .env("VESTIBULE_FRONTEND_BASE_URL"),
        )
        .arg(
            Arg::new(ARG_CEREMONY_TTL)
                .long(ARG_CEREMONY_TTL)
                .help("Continuation token lifetime in seconds")
                .default_value("300")
                .env("VESTIBULE_CEREMONY_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_ACCESS_TTL)
                .long(ARG_ACCESS_TTL)
                .help("Access token lifetime in seconds")
                .default_value("600")
                .env("VESTIBULE_ACCESS_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL)
                .long(ARG_REFRESH_TTL)
                .help("Refresh token and session lifetime in seconds")
                .default_value("1209600")
                .env("VESTIBULE_REFRESH_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        );

    logging::with_args(command)
}
