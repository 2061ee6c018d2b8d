use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("gardisto")
        .about("Access control for HTTP request pipelines")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("GARDISTO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("realm")
                .short('r')
                .long("realm")
                .help("Name of the policy domain")
                .default_value("Gardisto")
                .env("GARDISTO_REALM"),
        )
        .arg(
            Arg::new("auth-method")
                .short('m')
                .long("auth-method")
                .help("Authentication scheme, BASIC or FORM")
                .default_value("BASIC")
                .env("GARDISTO_AUTH_METHOD"),
        )
        .arg(
            Arg::new("login-page")
                .long("login-page")
                .help("Page the FORM scheme redirects unauthenticated users to")
                .env("GARDISTO_LOGIN_PAGE"),
        )
        .arg(
            Arg::new("error-page")
                .long("error-page")
                .help("Page the FORM scheme redirects to on bad credentials")
                .env("GARDISTO_ERROR_PAGE"),
        )
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .help("User as name:password:role1,role2 (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("protect")
                .long("protect")
                .help("Path pattern to protect, e.g. /secure/* (repeatable)")
                .default_value("/secure/*")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("role")
                .long("role")
                .help("Role required to reach protected patterns (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("digest-algorithm")
                .long("digest-algorithm")
                .help("Message digest used for single sign-on tokens")
                .default_value("MD5")
                .env("GARDISTO_DIGEST_ALGORITHM"),
        )
        .arg(
            Arg::new("random-source")
                .long("random-source")
                .help("Named random source used for single sign-on tokens")
                .default_value("chacha20")
                .env("GARDISTO_RANDOM_SOURCE"),
        )
        .arg(
            Arg::new("entropy")
                .long("entropy")
                .help("Extra entropy mixed into the token seed")
                .env("GARDISTO_ENTROPY"),
        )
        .arg(
            Arg::new("no-identity-cache")
                .long("no-identity-cache")
                .help("Do not cache authenticated principals in the session")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("allow-proxy-caching")
                .long("allow-proxy-caching")
                .help("Do not add headers that forbid intermediary caching")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sso")
                .long("sso")
                .help("Propagate logins into the single sign-on registry")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("GARDISTO_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
