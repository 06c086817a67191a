//! Error types for outlier-eval.

use csv;
use toml;

/// Creates the Error, ErrorKind, ResultExt, and Result types
error_chain!{
    errors {
        InvalidConfig(t: String) {
            description("invalid configuration")
            display("invalid configuration: {}", t)
        }
        MissingLabelSet(path: String) {
            description("ground-truth label set is missing")
            display("ground-truth label set is missing: {}", path)
        }
        Staging(t: String) {
            description("error in staging image directories")
            display("error in staging image directories: {}", t)
        }
    }

    foreign_links {
        Io(::std::io::Error);
        Csv(csv::Error);
        Toml(toml::de::Error);
    }
}
