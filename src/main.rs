//! Command line entry point: extract descriptors and rank stored materials.

use std::path::{Path, PathBuf};

use image::RgbImage;
use material_fingerprint::analysis::{
    FeatureExtractor, FeatureVector, ImageStatistics, MaterialFeatures, PairNormalizer,
};
use material_fingerprint::config::{self, AnalysisSettings};
use material_fingerprint::logging::{self, LogOptions};
use material_fingerprint::similarity::{
    CHARACTERISTIC_LEN, CharacteristicVector, MaterialCatalog, MaterialId, MaterialMatcher,
    Ranked,
};
use serde::Serialize;

fn main() {
    if let Err(err) = run(std::env::args().skip(1).collect()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let Some(invocation) = parse_args(args)? else {
        return Ok(());
    };
    let log_options = LogOptions {
        default_filter: if invocation.verbose { "debug" } else { "info" }.to_string(),
        log_to_file: !invocation.no_log_file,
    };
    if let Err(err) = logging::init_with(&log_options) {
        eprintln!("Logging disabled: {err}");
    }
    let settings = load_settings(invocation.config.as_deref())?;
    match invocation.command {
        Command::Features {
            images,
            normalize,
            specular,
        } => run_features(&settings, &images, normalize.as_deref(), specular),
        Command::Pair {
            non_specular,
            specular,
            normalize,
        } => run_pair(&settings, &non_specular, &specular, normalize.as_deref()),
        Command::Rank {
            catalog,
            target,
            filter,
            alpha,
            top,
        } => run_rank(&settings, &catalog, &target, &filter, alpha, top),
    }
}

fn load_settings(path: Option<&Path>) -> Result<AnalysisSettings, String> {
    let settings = match path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    };
    settings.map_err(|err| err.to_string())
}

#[derive(Serialize)]
struct FeatureReport {
    image: PathBuf,
    version: String,
    vector: FeatureVector,
    features: MaterialFeatures,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalized: Option<FeatureVector>,
}

fn run_features(
    settings: &AnalysisSettings,
    images: &[PathBuf],
    normalize: Option<&Path>,
    specular: bool,
) -> Result<(), String> {
    let extractor = settings.extractor().map_err(|err| err.to_string())?;
    let normalizer = match normalize {
        Some(path) => Some(PairNormalizer::load(path).map_err(|err| err.to_string())?),
        None => settings.normalizer().map_err(|err| err.to_string())?,
    };
    let version = extractor.version();
    let mut reports = Vec::with_capacity(images.len());
    for path in images {
        let image = open_rgb(path)?;
        let features = extractor
            .extract_rgb(&image)
            .map_err(|err| format!("{}: {err}", path.display()))?;
        let vector = features.to_vector();
        let normalized = normalizer.as_ref().map(|pair| {
            let table = if specular {
                pair.specular()
            } else {
                pair.non_specular()
            };
            table.normalize(&vector)
        });
        reports.push(FeatureReport {
            image: path.clone(),
            version: version.clone(),
            vector,
            features,
            normalized,
        });
    }
    print_json(&reports)
}

#[derive(Serialize)]
struct PairReport {
    version: String,
    non_specular: ImageStatistics,
    specular: ImageStatistics,
}

fn run_pair(
    settings: &AnalysisSettings,
    non_specular: &Path,
    specular: &Path,
    normalize: Option<&Path>,
) -> Result<(), String> {
    let extractor: FeatureExtractor = settings.extractor().map_err(|err| err.to_string())?;
    let normalizer = match normalize {
        Some(path) => PairNormalizer::load(path).map_err(|err| err.to_string())?,
        None => settings
            .normalizer()
            .map_err(|err| err.to_string())?
            .ok_or_else(|| {
                "pair requires --normalize or normalization.stats_path in the settings".to_string()
            })?,
    };
    let (non_specular_stats, specular_stats) = extractor
        .pair_statistics(&open_rgb(non_specular)?, &open_rgb(specular)?, &normalizer)
        .map_err(|err| err.to_string())?;
    print_json(&PairReport {
        version: extractor.version(),
        non_specular: non_specular_stats,
        specular: specular_stats,
    })
}

fn run_rank(
    settings: &AnalysisSettings,
    catalog: &Path,
    target: &RankTarget,
    filter: &CandidateFilter,
    alpha: Option<f64>,
    top: Option<usize>,
) -> Result<(), String> {
    let alpha = alpha.unwrap_or(settings.similarity.alpha);
    let catalog = MaterialCatalog::load(catalog).map_err(|err| err.to_string())?;
    let ranked: Vec<Ranked<MaterialId>> = if filter.is_empty() {
        let matcher = MaterialMatcher::new(catalog).with_alpha(alpha);
        match target {
            RankTarget::Id(id) => matcher
                .rank_by_id(*id)
                .map_err(|err| err.to_string())?
                .unwrap_or_default(),
            RankTarget::Characteristics(path) => matcher
                .rank_characteristics(&read_target(path)?)
                .map_err(|err| err.to_string())?,
        }
    } else {
        // The target may sit outside the filtered candidates.
        let vector = match target {
            RankTarget::Id(id) => catalog.get(*id).map(|record| record.characteristics),
            RankTarget::Characteristics(path) => Some(read_target(path)?),
        };
        match vector {
            Some(vector) => MaterialMatcher::new(filter.apply(&catalog))
                .with_alpha(alpha)
                .rank_characteristics(&vector)
                .map_err(|err| err.to_string())?,
            None => Vec::new(),
        }
    };
    let limit = top.unwrap_or(ranked.len());
    print_json(&ranked.into_iter().take(limit).collect::<Vec<_>>())
}

/// Restricts the ranked population by name substring and category.
#[derive(Debug, Clone, Default, PartialEq)]
struct CandidateFilter {
    name: Option<String>,
    categories: Vec<String>,
}

impl CandidateFilter {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.categories.is_empty()
    }

    fn apply(&self, catalog: &MaterialCatalog) -> MaterialCatalog {
        MaterialCatalog::new(
            catalog
                .filter(self.name.as_deref(), &self.categories)
                .cloned()
                .collect(),
        )
    }
}

/// A target file holds either named characteristics or the rating model's raw
/// 16-value output.
fn parse_target(text: &str) -> Result<CharacteristicVector, String> {
    match serde_json::from_str::<serde_json::Value>(text).map_err(|err| err.to_string())? {
        serde_json::Value::Array(values) => {
            let ratings: [f64; CHARACTERISTIC_LEN] = values
                .iter()
                .map(|value| value.as_f64().ok_or("ratings must be numbers"))
                .collect::<Result<Vec<_>, _>>()?
                .try_into()
                .map_err(|values: Vec<f64>| {
                    format!("expected {CHARACTERISTIC_LEN} ratings, got {}", values.len())
                })?;
            Ok(CharacteristicVector::from_model_ratings(ratings))
        }
        value @ serde_json::Value::Object(_) => {
            serde_json::from_value(value).map_err(|err| err.to_string())
        }
        _ => Err("expected a JSON object or array".to_string()),
    }
}

fn read_target(path: &Path) -> Result<CharacteristicVector, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
    parse_target(&text)
        .map_err(|err| format!("Invalid characteristics in {}: {err}", path.display()))
}

fn open_rgb(path: &Path) -> Result<RgbImage, String> {
    image::open(path)
        .map(|image| image.to_rgb8())
        .map_err(|err| format!("Failed to open {}: {err}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to encode output: {err}"))?;
    println!("{text}");
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
struct Invocation {
    command: Command,
    config: Option<PathBuf>,
    verbose: bool,
    no_log_file: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Features {
        images: Vec<PathBuf>,
        normalize: Option<PathBuf>,
        specular: bool,
    },
    Pair {
        non_specular: PathBuf,
        specular: PathBuf,
        normalize: Option<PathBuf>,
    },
    Rank {
        catalog: PathBuf,
        target: RankTarget,
        filter: CandidateFilter,
        alpha: Option<f64>,
        top: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum RankTarget {
    Id(MaterialId),
    Characteristics(PathBuf),
}

fn parse_args(args: Vec<String>) -> Result<Option<Invocation>, String> {
    let Some(subcommand) = args.first() else {
        return Err(help_text());
    };
    if matches!(subcommand.as_str(), "-h" | "--help" | "help") {
        println!("{}", help_text());
        return Ok(None);
    }

    let mut config = None;
    let mut verbose = false;
    let mut no_log_file = false;
    let mut normalize = None;
    let mut specular = false;
    let mut catalog = None;
    let mut id = None;
    let mut target = None;
    let mut filter = CandidateFilter::default();
    let mut alpha = None;
    let mut top = None;
    let mut positional = Vec::new();

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "-v" | "--verbose" => verbose = true,
            "--no-log-file" => no_log_file = true,
            "--specular" => specular = true,
            "--config" => config = Some(PathBuf::from(value_of(&args, &mut idx)?)),
            "--normalize" => normalize = Some(PathBuf::from(value_of(&args, &mut idx)?)),
            "--catalog" => catalog = Some(PathBuf::from(value_of(&args, &mut idx)?)),
            "--target" => target = Some(PathBuf::from(value_of(&args, &mut idx)?)),
            "--name" => filter.name = Some(value_of(&args, &mut idx)?.to_string()),
            "--category" => filter.categories.push(value_of(&args, &mut idx)?.to_string()),
            "--id" => {
                let value = value_of(&args, &mut idx)?;
                id = Some(
                    value
                        .parse::<MaterialId>()
                        .map_err(|_| format!("Invalid --id value: {value}"))?,
                );
            }
            "--alpha" => {
                let value = value_of(&args, &mut idx)?;
                let parsed = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid --alpha value: {value}"))?;
                if !(0.0..=1.0).contains(&parsed) {
                    return Err(format!("--alpha must be within [0, 1], got {value}"));
                }
                alpha = Some(parsed);
            }
            "--top" => {
                let value = value_of(&args, &mut idx)?;
                top = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --top value: {value}"))?,
                );
            }
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            value => positional.push(PathBuf::from(value)),
        }
        idx += 1;
    }

    let command = match subcommand.as_str() {
        "features" => {
            if positional.is_empty() {
                return Err("features requires at least one image path".to_string());
            }
            Command::Features {
                images: positional,
                normalize,
                specular,
            }
        }
        "pair" => {
            let [non_specular, specular]: [PathBuf; 2] = positional
                .try_into()
                .map_err(|_| "pair requires exactly two image paths".to_string())?;
            Command::Pair {
                non_specular,
                specular,
                normalize,
            }
        }
        "rank" => {
            let catalog = catalog.ok_or_else(|| "rank requires --catalog".to_string())?;
            if !positional.is_empty() {
                return Err("rank takes no positional arguments".to_string());
            }
            let target = match (id, target) {
                (Some(id), None) => RankTarget::Id(id),
                (None, Some(path)) => RankTarget::Characteristics(path),
                _ => return Err("rank requires exactly one of --id or --target".to_string()),
            };
            Command::Rank {
                catalog,
                target,
                filter,
                alpha,
                top,
            }
        }
        unknown => return Err(format!("Unknown command: {unknown}\n\n{}", help_text())),
    };

    Ok(Some(Invocation {
        command,
        config,
        verbose,
        no_log_file,
    }))
}

fn value_of<'a>(args: &'a [String], idx: &mut usize) -> Result<&'a str, String> {
    let flag = &args[*idx];
    *idx += 1;
    args.get(*idx)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn help_text() -> String {
    [
        "material-fingerprint",
        "",
        "Extract statistical material descriptors and rank stored materials.",
        "",
        "Usage:",
        "  material-fingerprint features [--normalize <path>] [--specular] <image>...",
        "  material-fingerprint pair <non-specular> <specular> [--normalize <path>]",
        "  material-fingerprint rank --catalog <path> (--id <id> | --target <path>)",
        "                            [--name <text>] [--category <c>]... [--alpha <a>] [--top <n>]",
        "",
        "Options:",
        "  --config <path>      Settings file (defaults to analysis.toml in the app directory).",
        "  --normalize <path>   Mean/std table with 28 rows (non-specular first).",
        "  --specular           Normalize with the specular half of the table.",
        "  --catalog <path>     JSON array of stored materials.",
        "  --id <id>            Rank against a stored material.",
        "  --target <path>      Rank against a JSON file: named characteristics, or an",
        "                       array of 16 ratings in rating-model output order.",
        "  --name <text>        Only rank materials whose name contains the text.",
        "  --category <c>       Only rank materials in this category (repeatable).",
        "  --alpha <a>          Correlation weight in [0, 1] (default from settings).",
        "  --top <n>            Only print the best n matches.",
        "  -v, --verbose        Debug logging on stderr.",
        "  --no-log-file        Do not write a log file.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_features_with_options() {
        let parsed = parse_args(args(&[
            "features",
            "a.png",
            "--normalize",
            "stats.txt",
            "b.jpg",
            "--specular",
            "-v",
        ]))
        .unwrap()
        .unwrap();
        assert!(parsed.verbose);
        assert_eq!(
            parsed.command,
            Command::Features {
                images: vec!["a.png".into(), "b.jpg".into()],
                normalize: Some("stats.txt".into()),
                specular: true,
            }
        );
    }

    #[test]
    fn parses_rank_by_id() {
        let parsed = parse_args(args(&[
            "rank", "--catalog", "cat.json", "--id", "42", "--top", "3", "--alpha", "0.3",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(
            parsed.command,
            Command::Rank {
                catalog: "cat.json".into(),
                target: RankTarget::Id(42),
                filter: CandidateFilter::default(),
                alpha: Some(0.3),
                top: Some(3),
            }
        );
    }

    #[test]
    fn parses_rank_filters() {
        let parsed = parse_args(args(&[
            "rank", "--catalog", "c.json", "--target", "t.json", "--name", "oak",
            "--category", "wood", "--category", "fabric",
        ]))
        .unwrap()
        .unwrap();
        let Command::Rank { filter, target, .. } = parsed.command else {
            panic!("expected rank");
        };
        assert_eq!(target, RankTarget::Characteristics("t.json".into()));
        assert_eq!(filter.name.as_deref(), Some("oak"));
        assert_eq!(filter.categories, vec!["wood".to_string(), "fabric".to_string()]);
    }

    #[test]
    fn candidate_filter_restricts_the_catalog() {
        let catalog = MaterialCatalog::from_json(
            r#"[
                {"id": 1, "name": "Oak plank", "category": "wood", "characteristics": {}},
                {"id": 2, "name": "Oak veneer", "category": "laminate", "characteristics": {}},
                {"id": 3, "name": "Linen", "category": "fabric", "characteristics": {}}
            ]"#,
        )
        .unwrap();
        let filter = CandidateFilter {
            name: Some("oak".to_string()),
            categories: vec!["wood".to_string(), "fabric".to_string()],
        };
        let ids: Vec<_> = filter.apply(&catalog).records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(CandidateFilter::default().apply(&catalog).len(), 3);
    }

    #[test]
    fn target_file_accepts_named_or_model_order() {
        let named = parse_target(r#"{"shininess": 2.0, "warmth": -1.0}"#).unwrap();
        assert_eq!(named.shininess, 2.0);
        assert_eq!(named.warmth, -1.0);

        let ratings: Vec<String> = (0..CHARACTERISTIC_LEN).map(|i| i.to_string()).collect();
        let from_model = parse_target(&format!("[{}]", ratings.join(","))).unwrap();
        let expected: [f64; CHARACTERISTIC_LEN] = std::array::from_fn(|i| i as f64);
        assert_eq!(from_model, CharacteristicVector::from_model_ratings(expected));

        assert!(parse_target("[1.0, 2.0]").is_err());
    }

    #[test]
    fn rank_needs_exactly_one_target() {
        assert!(parse_args(args(&["rank", "--catalog", "c.json"])).is_err());
        assert!(
            parse_args(args(&[
                "rank", "--catalog", "c.json", "--id", "1", "--target", "t.json"
            ]))
            .is_err()
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_args(args(&["rank", "--catalog", "c", "--id", "x"])).is_err());
        assert!(parse_args(args(&["rank", "--catalog", "c", "--id", "1", "--alpha", "2"])).is_err());
        assert!(parse_args(args(&["features", "--config"])).is_err());
        assert!(parse_args(args(&["features"])).is_err());
        assert!(parse_args(args(&["pair", "only_one.png"])).is_err());
        assert!(parse_args(args(&["frobnicate"])).is_err());
        assert!(parse_args(Vec::new()).is_err());
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse_args(args(&["--help"])).unwrap(), None);
        assert_eq!(parse_args(args(&["features", "-h"])).unwrap(), None);
    }
}
