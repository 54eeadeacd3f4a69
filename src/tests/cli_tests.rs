//! Command-line flag handling.

use crate::{config_commands, handle, new_app, parse_args, Options};
use cycle_finder_lib::app::{Command, Outcome};
use cycle_finder_lib::config::{ApiConfig, Config};
use cycle_finder_lib::provider::CityBikesClient;
use cycle_finder_lib::ranking::SortField;
use tempfile::TempDir;
use tokio::runtime::Runtime;

fn args(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

#[test]
fn no_flags() {
    assert_eq!(parse_args(&[]).unwrap(), Options::default());
}

#[test]
fn one_shot_search_flags_become_commands_in_order() {
    let options =
        parse_args(&args("--max 10 --lon -0.12 --provider santander-cycles --lat 51.5 --min-bikes 2"))
            .unwrap();
    assert_eq!(
        options.commands,
        vec![
            Command::Provider("santander-cycles".to_string()),
            Command::At {
                latitude: "51.5".to_string(),
                longitude: "-0.12".to_string()
            },
            Command::MinBikes("2".to_string()),
            Command::MaxResults("10".to_string()),
        ]
    );
    assert!(!options.interactive);
}

#[test]
fn sort_flags() {
    let options = parse_args(&args("--sort free_bikes")).unwrap();
    assert_eq!(options.commands, vec![Command::Sort(SortField::FreeBikes)]);

    let options = parse_args(&args("--sort timestamp --desc")).unwrap();
    assert_eq!(
        options.commands,
        vec![
            Command::Sort(SortField::LastUpdated),
            Command::Sort(SortField::LastUpdated)
        ]
    );

    // Distance ascending is the starting sort
    let options = parse_args(&args("--sort distance")).unwrap();
    assert!(options.commands.is_empty());

    let options = parse_args(&args("--desc")).unwrap();
    assert_eq!(options.commands, vec![Command::Sort(SortField::Distance)]);
}

#[test]
fn here_and_modes() {
    let options = parse_args(&args("-i --here --config /etc/cycle.toml")).unwrap();
    assert!(options.interactive);
    assert_eq!(options.config_path.as_deref(), Some("/etc/cycle.toml"));
    assert_eq!(options.commands, vec![Command::Here]);

    assert!(parse_args(&args("--list-providers")).unwrap().list_providers);
    assert!(parse_args(&args("--help")).unwrap().help);
}

#[test]
fn bad_flags() {
    assert!(parse_args(&args("--lat 51.5")).is_err());
    assert!(parse_args(&args("--lat 51.5 --lon 0 --here")).is_err());
    assert!(parse_args(&args("--provider")).is_err());
    assert!(parse_args(&args("--sort name")).is_err());
    assert!(parse_args(&args("--frobnicate")).is_err());
}

#[test]
fn config_defaults_become_commands() {
    let mut config = Config::default();
    assert_eq!(
        config_commands(&config),
        vec![
            Command::MinBikes("0".to_string()),
            Command::MaxResults("5".to_string())
        ]
    );

    config.search.default_provider = Some("velib".to_string());
    assert_eq!(
        config_commands(&config)[0],
        Command::Provider("velib".to_string())
    );
}

#[test]
fn config_values_above_form_limits_are_clamped() {
    let mut config = Config::default();
    config.search.min_free_bikes = 150;
    config.search.max_results = 1000;
    let commands = config_commands(&config);
    assert_eq!(
        commands,
        vec![
            Command::MinBikes("99".to_string()),
            Command::MaxResults("200".to_string())
        ]
    );

    // Every clamped command is accepted by the form
    let mut app = new_app(&config);
    for command in commands {
        assert!(app.apply(command).is_ok());
    }
}

#[test]
fn failed_fetch_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        api: ApiConfig {
            // Nothing listens on the discard port
            base_url: "http://127.0.0.1:9/v2".to_string(),
            cache_path: dir.path().join("providers.json").display().to_string(),
            ..ApiConfig::default()
        },
        ..Config::default()
    };
    let rt = Runtime::new().unwrap();
    let client = CityBikesClient::new(&config.api);
    let mut app = new_app(&config);

    let fetch = handle(&rt, &client, &mut app, Outcome::Fetch("velib".to_string()));
    assert!(fetch.is_err());
    assert!(app.result().is_empty());

    let list = handle(&rt, &client, &mut app, Outcome::ListProviders);
    assert!(list.is_err());

    assert!(handle(&rt, &client, &mut app, Outcome::Nothing).unwrap());
    assert!(!handle(&rt, &client, &mut app, Outcome::Quit).unwrap());
}
