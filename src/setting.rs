//! A flexible sweep setting in TOML, plus parsing of the list literals given
//! on the command line.

use errors::*;
use job::{self, Method, MAX_POLLUTION};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use toml;

/// Program used to run the classifier script when nothing else is given.
pub const DEFAULT_PROGRAM: &str = "python";

/// The classifier script when nothing else is given.
pub const DEFAULT_SCRIPT: &str = "image_set_cleaner.py";

/// The sweep setting. Every field is optional; command line flags take
/// precedence over the file, and the file over the built-in defaults.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Setting {
    /// Interpreter or executable that runs the classifier.
    pub program: Option<String>,

    /// Classifier script handed to `program` as its first argument.
    pub script: Option<String>,

    /// Clustering methods to sweep.
    pub methods: Option<Vec<Method>>,

    /// Pollution percentages to sweep.
    pub pollutions: Option<Vec<u32>>,
}

impl Setting {
    /// Initialize from a file.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Setting> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .chain_err(|| format!("failed to open setting {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Setting::parse(&contents)
    }

    /// Parses a setting from TOML text and validates the grid it names.
    pub fn parse(contents: &str) -> Result<Setting> {
        let setting: Setting = toml::from_str(contents)?;
        if let Some(ref methods) = setting.methods {
            validate_methods(methods)?;
        }
        if let Some(ref pollutions) = setting.pollutions {
            validate_pollutions(pollutions)?;
        }
        Ok(setting)
    }

    /// Resolves the method list: command line, then setting, then default.
    pub fn resolve_methods(&self, cli: Option<&str>) -> Result<Vec<Method>> {
        match (cli, &self.methods) {
            (Some(literal), _) => parse_methods(literal),
            (None, &Some(ref methods)) => Ok(methods.clone()),
            (None, &None) => Ok(job::default_methods()),
        }
    }

    /// Resolves the pollution list: command line, then setting, then default.
    pub fn resolve_pollutions(&self, cli: Option<&str>) -> Result<Vec<u32>> {
        match (cli, &self.pollutions) {
            (Some(literal), _) => parse_pollutions(literal),
            (None, &Some(ref pollutions)) => Ok(pollutions.clone()),
            (None, &None) => Ok(job::default_pollutions()),
        }
    }

    /// The classifier program, `python` unless configured.
    pub fn program(&self) -> &str {
        self.program.as_ref().map(|s| s.as_str()).unwrap_or(DEFAULT_PROGRAM)
    }

    /// The classifier script, `image_set_cleaner.py` unless configured.
    pub fn script(&self) -> &str {
        self.script.as_ref().map(|s| s.as_str()).unwrap_or(DEFAULT_SCRIPT)
    }
}

fn invalid(msg: String) -> Error {
    ErrorKind::InvalidConfig(msg).into()
}

/// Splits a list literal such as `['kmeans', 'birch']` or `0,5,10` into its
/// unquoted items.
fn split_literal(literal: &str) -> Result<Vec<String>> {
    let mut body = literal.trim();
    if body.starts_with('[') || body.ends_with(']') {
        if !(body.starts_with('[') && body.ends_with(']') && body.len() >= 2) {
            return Err(invalid(format!("unbalanced brackets in {:?}", literal)));
        }
        body = &body[1..body.len() - 1];
    }

    let mut items = Vec::new();
    for raw in body.split(',') {
        let item = raw.trim();
        // a trailing comma is tolerated, an empty item elsewhere is not
        if item.is_empty() {
            continue;
        }
        items.push(unquote(item).ok_or_else(|| {
            invalid(format!("malformed item {:?} in {:?}", item, literal))
        })?);
    }

    if items.is_empty() {
        return Err(invalid(format!("empty list {:?}", literal)));
    }
    if body.split(',').rev().skip(1).any(|s| s.trim().is_empty()) {
        return Err(invalid(format!("empty item in {:?}", literal)));
    }
    Ok(items)
}

fn unquote(item: &str) -> Option<String> {
    let first = item.chars().next()?;
    if first == '\'' || first == '"' {
        if item.len() < 2 || !item.ends_with(first) {
            return None;
        }
        let inner = &item[1..item.len() - 1];
        if inner.contains(first) {
            return None;
        }
        Some(inner.to_string())
    } else if item.contains('\'') || item.contains('"') {
        None
    } else {
        Some(item.to_string())
    }
}

/// Parses a method list literal. Fails with `InvalidConfig` on an unknown
/// method, a malformed literal, or an empty list.
pub fn parse_methods(literal: &str) -> Result<Vec<Method>> {
    let methods = split_literal(literal)?
        .iter()
        .map(|s| s.parse::<Method>())
        .collect::<Result<Vec<_>>>()?;
    validate_methods(&methods)?;
    Ok(methods)
}

/// Parses a pollution list literal. Items are integers or ranges (`a..b`,
/// `a..=b`). Fails with `InvalidConfig` when an item is not an integer, when a
/// value falls outside 0..=100, or when the list is empty.
pub fn parse_pollutions(literal: &str) -> Result<Vec<u32>> {
    let mut pollutions = Vec::new();
    for item in split_literal(literal)? {
        if let Some(idx) = item.find("..") {
            let (lo, rest) = item.split_at(idx);
            let rest = &rest[2..];
            let (hi, inclusive) = if rest.starts_with('=') {
                (&rest[1..], true)
            } else {
                (rest, false)
            };
            let lo = parse_pollution(lo)?;
            let hi = parse_pollution(hi)?;
            let end = if inclusive { hi + 1 } else { hi };
            if end <= lo {
                return Err(invalid(format!("empty pollution range {:?}", item)));
            }
            pollutions.extend(lo..end);
        } else {
            pollutions.push(parse_pollution(&item)?);
        }
    }
    validate_pollutions(&pollutions)?;
    Ok(pollutions)
}

fn parse_pollution(s: &str) -> Result<u32> {
    let digits = s.trim();
    // `u32::from_str` alone would also take a leading `+`
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(format!("pollution {:?} is not a non-negative integer", s)));
    }
    let p = digits
        .parse::<u32>()
        .map_err(|_| invalid(format!("pollution {:?} is out of range", s)))?;
    validate_pollutions(&[p])?;
    Ok(p)
}

fn validate_methods(methods: &[Method]) -> Result<()> {
    if methods.is_empty() {
        return Err(invalid("no clustering method given".to_string()));
    }
    Ok(())
}

fn validate_pollutions(pollutions: &[u32]) -> Result<()> {
    if pollutions.is_empty() {
        return Err(invalid("no pollution given".to_string()));
    }
    match pollutions.iter().find(|&&p| p > MAX_POLLUTION) {
        Some(p) => Err(invalid(format!(
            "pollution {} is outside 0..={}",
            p,
            MAX_POLLUTION
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid<T: ::std::fmt::Debug>(r: Result<T>) -> bool {
        match r {
            Err(Error(ErrorKind::InvalidConfig(_), _)) => true,
            other => {
                println!("unexpected: {:?}", other);
                false
            }
        }
    }

    #[test]
    fn parse_method_literals() {
        assert_eq!(
            parse_methods("['kmeans', 'birch']").unwrap(),
            vec![Method::KMeans, Method::Birch]
        );
        assert_eq!(
            parse_methods("gaussian_mixture,agglomerative_clustering").unwrap(),
            vec![Method::GaussianMixture, Method::AgglomerativeClustering]
        );
        assert_eq!(parse_methods("[\"kmeans\"]").unwrap(), vec![Method::KMeans]);
    }

    #[test]
    fn reject_bad_method_literals() {
        assert!(is_invalid(parse_methods("['kmeans', 'dbscan']")));
        assert!(is_invalid(parse_methods("[]")));
        assert!(is_invalid(parse_methods("['kmeans'")));
        assert!(is_invalid(parse_methods("['kmeans]")));
        assert!(is_invalid(parse_methods("kmeans,,birch")));
    }

    #[test]
    fn parse_pollution_literals() {
        assert_eq!(parse_pollutions("[0, 5, 10]").unwrap(), vec![0, 5, 10]);
        assert_eq!(parse_pollutions("3").unwrap(), vec![3]);
        assert_eq!(parse_pollutions("0..3").unwrap(), vec![0, 1, 2]);
        assert_eq!(parse_pollutions("[0..=2, 50]").unwrap(), vec![0, 1, 2, 50]);
        assert_eq!(parse_pollutions("[100,]").unwrap(), vec![100]);
    }

    #[test]
    fn reject_bad_pollution_literals() {
        assert!(is_invalid(parse_pollutions("[101]")));
        assert!(is_invalid(parse_pollutions("[-1]")));
        assert!(is_invalid(parse_pollutions("[1.5]")));
        assert!(is_invalid(parse_pollutions("five")));
        assert!(is_invalid(parse_pollutions("5..5")));
        assert!(is_invalid(parse_pollutions("0..=101")));
        assert!(is_invalid(parse_pollutions("")));
    }

    #[test]
    fn reject_signed_pollutions() {
        assert!(is_invalid(parse_pollutions("[+5]")));
        assert!(is_invalid(parse_pollutions("+0..3")));
        assert!(is_invalid(parse_pollutions("0..=+3")));
        assert!(is_invalid(parse_pollutions("['+7']")));
        assert!(is_invalid(parse_pollutions("[- 1]")));
    }

    #[test]
    fn setting_from_toml() {
        let setting = Setting::parse(
            r#"
program = "python3"
methods = ["kmeans", "birch"]
pollutions = [0, 10, 20]
"#,
        ).unwrap();
        assert_eq!(setting.program(), "python3");
        assert_eq!(setting.script(), DEFAULT_SCRIPT);
        assert_eq!(
            setting.resolve_methods(None).unwrap(),
            vec![Method::KMeans, Method::Birch]
        );
        assert_eq!(setting.resolve_pollutions(None).unwrap(), vec![0, 10, 20]);
        // the command line wins over the file
        assert_eq!(setting.resolve_pollutions(Some("[7]")).unwrap(), vec![7]);
    }

    #[test]
    fn setting_rejects_out_of_range() {
        assert!(is_invalid(Setting::parse("pollutions = [0, 200]")));
        assert!(Setting::parse("methods = [\"dbscan\"]").is_err());
        assert!(Setting::parse("colour = \"blue\"").is_err());
    }

    #[test]
    fn empty_setting_uses_defaults() {
        let setting = Setting::default();
        assert_eq!(setting.program(), DEFAULT_PROGRAM);
        assert_eq!(setting.resolve_methods(None).unwrap(), job::default_methods());
        assert_eq!(setting.resolve_pollutions(None).unwrap().len(), 41);
    }
}
