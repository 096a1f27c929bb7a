/// Name of the environment variable containing the path to the propscope configuration file.
/// If not set, [`crate::utils::conf::ProbeConfig::default`] is used.
pub const ENV_CONFIG_PATH: &str = "PROPSCOPE_CONFIG_PATH";

/// Name of the environment variable that switches the delegate metadata facility off.
/// Accepted "off" values are listed in [`CAPABILITY_OFF_VALUES`].
pub const ENV_DELEGATE_METADATA: &str = "PROPSCOPE_DELEGATE_METADATA";

pub const CAPABILITY_OFF_VALUES: &[&str] = &["0", "false", "off", "no"];

/// Storage prefix of compiler-generated interface delegates (`$$delegate_0`, `$$delegate_1`, ...).
pub const INTERFACE_DELEGATE_PREFIX: &str = "$$delegate_";

/// Storage suffix of lazily cached properties (`foo$delegate`).
pub const LAZY_DELEGATE_SUFFIX: &str = "$delegate";

/// Storage suffix of properties forwarded to another object's member (`foo$receiver`).
pub const REFERENCE_DELEGATE_SUFFIX: &str = "$receiver";

/// Storage suffix of map-backed and custom-provider properties.
pub const PROVIDER_DELEGATE_SUFFIX: &str = "$delegate";

pub const LAZY_WRAPPER_TYPES: &[&str] = &["kotlin.Lazy", "Lazy"];

pub const MAP_TYPES: &[&str] = &[
    "kotlin.collections.Map",
    "kotlin.collections.MutableMap",
    "java.util.Map",
    "java.util.HashMap",
    "java.util.LinkedHashMap",
    "Map",
    "MutableMap",
];

/// Storage identifiers injected by coverage tools.
pub const EXCLUDED_STORAGE_NAMES: &[&str] = &["__cobertura_counters"];

/// Storage prefixes injected by compilers for initialization tracking.
pub const EXCLUDED_STORAGE_PREFIXES: &[&str] = &["bitmap$init$"];

/// Name of the top type, the fallback for wildcards without a useful bound.
pub const TOP_TYPE: &str = "Any";
