use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

fn phone_arg(required: bool) -> Arg {
    Arg::new("phone")
        .short('p')
        .long("phone")
        .help("Phone number without the country code, e.g. 901234567")
        .env("EXAMGATE_PHONE")
        .required(required)
}

fn stats_arg() -> Arg {
    Arg::new("stats")
        .long("stats")
        .help("Use the admin user statistics instead of the exam countdown")
        .action(ArgAction::SetTrue)
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("examgate")
        .about("Exam portal client - sign in and follow the exam countdown")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("login")
                .about("Sign in with phone number and password")
                .arg(phone_arg(false))
                .arg(
                    Arg::new("no-remember")
                        .long("no-remember")
                        .help("Do not keep the session after this run")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the current session"))
        .subcommand(
            Command::new("register")
                .about("Create an account; a verification SMS is sent to the phone")
                .arg(Arg::new("firstname").long("firstname").required(true))
                .arg(Arg::new("lastname").long("lastname").required(true))
                .arg(
                    Arg::new("class")
                        .long("class")
                        .help("School class, e.g. 9")
                        .required(true),
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .help("Exam language")
                        .default_value("uz"),
                )
                .arg(phone_arg(true)),
        )
        .subcommand(
            Command::new("verify")
                .about("Confirm a registration with the SMS code")
                .arg(phone_arg(true))
                .arg(
                    Arg::new("code")
                        .short('c')
                        .long("code")
                        .help("Code received by SMS")
                        .required(true),
                ),
        )
        .subcommand(Command::new("status").about("Show the current session"))
        .subcommand(
            Command::new("countdown")
                .about("Fetch the remaining time once")
                .arg(stats_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the raw snapshot as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Show a live countdown, refreshed from the server periodically")
                .arg(stats_arg())
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .help("Seconds between refreshes (defaults to the configured interval)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
}
