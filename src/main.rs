use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Context;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use maven_artifact::config::{RepositoryConfig, DEFAULT_REPOSITORY, DEFAULT_USER_AGENT};
use maven_artifact::maven::{DownloadStatus, MavenArtifactRef};
use maven_artifact::util::checksum::HashAlgorithm;
use maven_artifact::util::credentials::Credentials;
use maven_artifact::util::progress::{NoProgress, ProgressObserver};

const EXAMPLE: &str = "Example:\n  maven-artifact \"org.apache.solr:solr:war:3.5.0\"";

#[derive(Parser)]
#[command(name = "maven-artifact")]
#[command(about = "Downloads an artifact from a Maven repository")]
#[command(version)]
#[command(after_help = EXAMPLE)]
struct Cli {
    /// Maven coordinate as defined by http://maven.apache.org/pom.html#Maven_Coordinates, i.e.
    /// groupId:artifactId:version, groupId:artifactId:packaging:version or
    /// groupId:artifactId:packaging:classifier:version. The version may be "latest".
    maven_coordinate: String,

    /// Target file or existing directory. Defaults to <artifactId>[-<classifier>].<extension>
    /// in the current directory. The directory must exist prior to download.
    filename: Option<PathBuf>,

    /// Maven repository URL
    #[arg(short = 'm', long = "maven-repo", env = "MAVEN_REPO", default_value = DEFAULT_REPOSITORY)]
    base: String,

    /// Username (must be combined with --password)
    #[arg(short, long, requires = "password")]
    username: Option<String>,

    /// Password (combined with --username) or base64 encoded username:password on its own
    #[arg(short, long)]
    password: Option<String>,

    /// OAuth bearer token (can not be combined with --username or --password). A token from
    /// MAVEN_TOKEN is ignored if --username or --password is given.
    #[arg(short, long, env = "MAVEN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Hash type used to check whether an existing file is up to date: md5, sha1, sha256 or sha512
    #[arg(short = 'H', long = "hash-type", default_value = "md5", value_parser = HashAlgorithm::from_str)]
    hash_type: HashAlgorithm,

    /// Don't print progress and status messages
    #[arg(short, long)]
    quiet: bool,
}

/// Shows a progress bar on stderr, or a spinner if the server does not send a content length
struct ProgressBarObserver {
    bar: ProgressBar,
}
impl ProgressBarObserver {
    fn new() -> ProgressBarObserver {
        ProgressBarObserver {
            bar: ProgressBar::hidden(),
        }
    }
}
impl ProgressObserver for ProgressBarObserver {
    fn on_start(&self, total: Option<u64>) {
        match total {
            Some(total) => {
                self.bar.set_length(total);
                self.bar.set_style(
                    ProgressStyle::with_template("{bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%) {bytes_per_sec}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
            }
            None => {
                self.bar.set_style(
                    ProgressStyle::with_template("{spinner} {bytes} {bytes_per_sec}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
            }
        }
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn on_progress(&self, downloaded: u64, _total: Option<u64>) {
        self.bar.set_position(downloaded);
    }

    fn on_finish(&self, _downloaded: u64) {
        self.bar.finish_and_clear();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let (username, password, token) = credential_args(&cli, &matches);
    let credentials = match Credentials::from_args(username, password, token) {
        Ok(credentials) => credentials,
        Err(e) => Cli::command()
            .error(clap::error::ErrorKind::ArgumentConflict, e)
            .exit(),
    };

    match run(&cli, credentials).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

/// username, password and token as given. A token from the environment yields to a username or
///  password on the command line, a token on the command line is left for [Credentials::from_args]
///  to reject.
fn credential_args(cli: &Cli, matches: &ArgMatches) -> (Option<String>, Option<String>, Option<String>) {
    let token_from_env = matches.value_source("token") == Some(ValueSource::EnvVariable);
    let token = if token_from_env && (cli.username.is_some() || cli.password.is_some()) {
        debug!("ignoring MAVEN_TOKEN in favor of --username / --password");
        None
    }
    else {
        cli.token.clone()
    };
    (cli.username.clone(), cli.password.clone(), token)
}

async fn run(cli: &Cli, credentials: Credentials) -> anyhow::Result<()> {
    let artifact = MavenArtifactRef::parse(&cli.maven_coordinate)?;

    let config = RepositoryConfig {
        base_uri: cli.base.clone(),
        credentials,
        user_agent: DEFAULT_USER_AGENT.to_string(),
    };
    let fetcher = config.fetcher()
        .with_context(|| format!("invalid repository {:?}", cli.base))?;

    let progress: Box<dyn ProgressObserver> = if cli.quiet {
        Box::new(NoProgress)
    }
    else {
        Box::new(ProgressBarObserver::new())
    };

    let download = fetcher
        .download(&artifact, cli.filename.as_deref(), cli.hash_type, progress.as_ref())
        .await?;

    if !cli.quiet {
        match download.status {
            DownloadStatus::UpToDate => {
                println!("{} is already up to date", artifact);
            }
            DownloadStatus::Downloaded { .. } => {
                println!("Maven artifact {} is downloaded to {}", download.artifact, download.path.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use maven_artifact::util::credentials::CredentialsError;
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["maven-artifact", "g:a:1.0"]).unwrap();
        assert_eq!(cli.maven_coordinate, "g:a:1.0");
        assert_eq!(cli.filename, None);
        assert_eq!(cli.hash_type, HashAlgorithm::Md5);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "maven-artifact", "-m", "https://repo.example.com/maven2", "-u", "user", "-p", "pass",
            "-H", "sha1", "-q", "g:a:war:1.0", "target.war",
        ]).unwrap();
        assert_eq!(cli.base, "https://repo.example.com/maven2");
        assert_eq!(cli.username.as_deref(), Some("user"));
        assert_eq!(cli.password.as_deref(), Some("pass"));
        assert_eq!(cli.hash_type, HashAlgorithm::Sha1);
        assert_eq!(cli.filename, Some(PathBuf::from("target.war")));
        assert!(cli.quiet);
    }

    #[test]
    fn test_rejected_arguments() {
        assert!(Cli::try_parse_from(["maven-artifact", "g:a:1.0", "-u", "user"]).is_err());
        assert!(Cli::try_parse_from(["maven-artifact", "g:a:1.0", "-H", "crc32"]).is_err());
        assert!(Cli::try_parse_from(["maven-artifact"]).is_err());
    }

    fn parse(args: &[&str]) -> (Cli, ArgMatches) {
        let matches = Cli::command().try_get_matches_from(args).unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        (cli, matches)
    }

    #[test]
    fn test_token_on_command_line_conflicts_with_password() {
        let (cli, matches) = parse(&["maven-artifact", "-u", "user", "-p", "pass", "-t", "tok", "g:a:1.0"]);
        let (username, password, token) = credential_args(&cli, &matches);
        assert_eq!(token.as_deref(), Some("tok"));
        assert_eq!(
            Credentials::from_args(username, password, token),
            Err(CredentialsError::TokenWithPassword),
        );
    }

    // NB: the only test touching the process environment
    #[test]
    fn test_environment() {
        std::env::set_var("MAVEN_TOKEN", "env-token");
        std::env::set_var("MAVEN_REPO", "https://env.example.com/maven2");

        let (cli, matches) = parse(&["maven-artifact", "g:a:1.0"]);
        assert_eq!(cli.base, "https://env.example.com/maven2");
        assert_eq!(credential_args(&cli, &matches), (None, None, Some("env-token".to_string())));

        let (cli, matches) = parse(&["maven-artifact", "-u", "user", "-p", "pass", "g:a:1.0"]);
        let (username, password, token) = credential_args(&cli, &matches);
        assert_eq!(token, None);
        assert_eq!(
            Credentials::from_args(username, password, token),
            Ok(Credentials::Basic { username: "user".to_string(), password: "pass".to_string() }),
        );

        let (cli, matches) = parse(&["maven-artifact", "-p", "dXNlcjpwYXNz", "g:a:1.0"]);
        assert_eq!(credential_args(&cli, &matches).2, None);

        let (cli, matches) = parse(&["maven-artifact", "-m", "https://cli.example.com/maven2", "-t", "cli-token", "g:a:1.0"]);
        assert_eq!(cli.base, "https://cli.example.com/maven2");
        assert_eq!(credential_args(&cli, &matches).2.as_deref(), Some("cli-token"));

        std::env::remove_var("MAVEN_TOKEN");
        std::env::remove_var("MAVEN_REPO");
    }
}
