//! Command line definition.
//!
//! Flags keep the single-dash spelling the tool has always used (`-url=host`,
//! `-e key=value`); [`normalize_args`] rewrites them to the double-dash form
//! clap expects, so both spellings are accepted.

use std::ffi::OsString;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};

use crate::utils::extra_config::{ExtraConfigEntry, ExtraConfigParseError};
use crate::utils::presence::PresenceSet;

/// Flag names accepted with a single leading dash.
const SINGLE_DASH_FLAGS: &[&str] = &[
    "url", "user", "token", "insecure", "org", "vdc", "vm", "e", "poweron", "verbose", "help",
    "version",
];

/// Flags that take their value from the next argument when written without `=`.
const VALUE_FLAGS: &[&str] = &["url", "user", "token", "org", "vdc", "vm", "e"];

#[derive(Parser, Debug, Clone)]
#[command(name = "vcd-extraconfig")]
#[command(about = "Set extraConfig keys on a Cloud Director VM and optionally power it on")]
#[command(version = env!("VCD_EXTRACONFIG_VERSION"))]
pub struct Cli {
    /// Cloud Director URL [VCD_URL]
    #[arg(
        id = "url",
        long = "url",
        env = "VCD_URL",
        value_name = "HOST",
        allow_hyphen_values = true
    )]
    pub url: Option<String>,

    /// User to authenticate as; the token is then used as its password [VCD_USER]
    #[arg(id = "user", long = "user", env = "VCD_USER", allow_hyphen_values = true)]
    pub user: Option<String>,

    /// API Token to authenticate to Cloud Director [VCD_TOKEN]
    #[arg(
        id = "token",
        long = "token",
        env = "VCD_TOKEN",
        hide_env_values = true,
        allow_hyphen_values = true
    )]
    pub token: Option<String>,

    /// Disable certificate verification
    #[arg(
        id = "insecure",
        long = "insecure",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub insecure: bool,

    /// Tenant Organization
    #[arg(id = "org", long = "org", allow_hyphen_values = true)]
    pub org: Option<String>,

    /// Organization Virtual Datacenter
    #[arg(id = "vdc", long = "vdc", allow_hyphen_values = true)]
    pub vdc: Option<String>,

    /// Target VM Name
    #[arg(id = "vm", long = "vm", allow_hyphen_values = true)]
    pub vm: Option<String>,

    /// ExtraConfig with format <key>=<value>, may be repeated
    #[arg(
        id = "e",
        short = 'e',
        long = "e",
        value_name = "KEY=VALUE",
        action = ArgAction::Append,
        allow_hyphen_values = true,
        value_parser = parse_extra_config
    )]
    pub extra_config: Vec<ExtraConfigEntry>,

    /// Power on the VM after updating extraConfig
    #[arg(
        id = "poweron",
        long = "poweron",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub poweron: bool,

    /// Print progress for every step
    #[arg(
        id = "verbose",
        long = "verbose",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub verbose: bool,
}

fn parse_extra_config(raw: &str) -> Result<ExtraConfigEntry, ExtraConfigParseError> {
    ExtraConfigEntry::parse(raw)
}

impl Cli {
    /// Parse `args` (program name first) and record which flags were supplied.
    pub fn try_parse_with_presence<I, T>(args: I) -> Result<(Self, PresenceSet), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let command = Self::command();
        let matches = command.clone().try_get_matches_from(normalize_args(args))?;
        let presence = PresenceSet::collect(&command, &matches);
        let cli = Self::from_arg_matches(&matches)?;
        Ok((cli, presence))
    }

    /// Full help text, printed when required arguments are missing.
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}

/// Rewrite `-flag` and `-flag=value` into `--flag` / `--flag=value` for known flags.
///
/// The first argument is the program name and is kept as is, as is everything
/// after a bare `--`. The argument following a value-taking flag written
/// without `=` is its value and is never rewritten, so `-vm -url` names a VM
/// called `-url`.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        if arg == "--" {
            normalized.push(arg);
            normalized.extend(args.by_ref());
            break;
        }
        let takes_next = expects_separate_value(&arg);
        normalized.push(promote_single_dash(arg));
        if takes_next {
            normalized.extend(args.next());
        }
    }

    normalized
}

/// Name of a known flag written as `-name[=value]` or `--name[=value]`.
fn flag_name(text: &str) -> Option<&str> {
    let flag = text
        .strip_prefix("--")
        .or_else(|| text.strip_prefix('-'))?;
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    SINGLE_DASH_FLAGS.contains(&name).then_some(name)
}

fn expects_separate_value(arg: &OsString) -> bool {
    arg.to_str().is_some_and(|text| {
        !text.contains('=') && flag_name(text).is_some_and(|name| VALUE_FLAGS.contains(&name))
    })
}

fn promote_single_dash(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };
    if text.starts_with("--") || flag_name(text).is_none() {
        return arg;
    }
    OsString::from(format!("-{text}"))
}
