#[macro_use] extern crate clap;

use clap::{App, ArgMatches};
use env_logger::{from_env, Env};
use kbundle::{
    manifest::{ImageRewriter, ImageScanner, InvalidImagePolicy},
    BundleConfig, ImageMap, ImageSet, UserDefinedImage,
};
use std::{error::Error, fs};

type Result<T> = std::result::Result<T, Box<dyn Error>>;

fn main() {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml)
        .version(crate_version!())
        .get_matches();

    let log_level = matches.value_of("log_level").unwrap();
    from_env(Env::default().default_filter_or(log_level)).init();

    let result = user_defined_images(&matches).and_then(|rules| match matches.subcommand() {
        ("images", Some(sub)) => images(sub, &rules),
        ("relocate", Some(sub)) => relocate(sub, &rules),
        (name, _) => Err(format!("unknown subcommand {:?}", name).into()),
    });
    if let Err(err) = result {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn user_defined_images(matches: &ArgMatches) -> Result<Vec<UserDefinedImage>> {
    match matches.value_of("config") {
        None => Ok(Vec::new()),
        Some(path) => {
            let config = BundleConfig::from_json(&fs::read_to_string(path)?)?;
            log::info!(
                "{} {}: {} user-defined image rules",
                config.name,
                config.version,
                config.user_defined_images.len()
            );
            Ok(config.user_defined_images)
        }
    }
}

fn images(matches: &ArgMatches, rules: &[UserDefinedImage]) -> Result<()> {
    let policy = if matches.is_present("skip_invalid") {
        InvalidImagePolicy::Skip
    } else {
        InvalidImagePolicy::Fail
    };
    let scanner: ImageScanner = ImageScanner::new()
        .invalid_images(policy)
        .user_defined_images(rules)?;

    let mut images = ImageSet::empty();
    for path in string_values(matches, "manifests") {
        let text = fs::read_to_string(&path)?;
        let found = scanner
            .scan_str(&text)
            .map_err(|err| format!("{}: {}", path, err))?;
        images = images.union(&found);
    }
    for image in images.strings() {
        println!("{}", image);
    }
    Ok(())
}

fn relocate(matches: &ArgMatches, rules: &[UserDefinedImage]) -> Result<()> {
    let path = matches.value_of("manifest").unwrap();
    let map = ImageMap::from_pairs(map_values(matches, "map")?)?;
    let rewriter = ImageRewriter::new().user_defined_images(rules)?;
    let text = fs::read_to_string(path)?;
    let rewritten = rewriter
        .rewrite(&text, &map)
        .map_err(|err| format!("{}: {}", path, err))?;
    print!("{}", rewritten);
    Ok(())
}

fn string_values<S: AsRef<str>>(matches: &ArgMatches, name: S) -> Vec<String> {
    matches
        .values_of(name)
        .into_iter()
        .map(|values| values.map(|value| value.to_string()))
        .flatten()
        .collect()
}

fn map_values<S: AsRef<str>>(matches: &ArgMatches, name: S) -> Result<Vec<(String, String)>> {
    string_values(matches, name)
        .iter()
        .map(|map_str| -> Result<(String, String)> {
            let mut parts = map_str.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(old), Some(new)) => Ok((old.to_string(), new.to_string())),
                _ => Err(format!("expected OLD=NEW, found {:?}", map_str).into()),
            }
        })
        .collect()
}
