use std::path::PathBuf;

pub enum RouterError {
    EmptyMethods,
    InvalidMethod(String),
    InvalidPattern(String),
    RouteNotFound(String),
    MissingParameters {
        route: String,
        expected: Vec<String>,
        received: Vec<String>,
    },
    ConstraintMismatch {
        param: String,
        constraint: String,
    },
    CacheDirectoryMissing(PathBuf),
    CacheDirectoryNotWritable(PathBuf),
    CacheFileNotWritable(PathBuf),
    InvalidCacheContents(PathBuf, String),
    IoError(std::io::Error),
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RouterError::EmptyMethods => write!(f, "HTTP methods argument was empty; must contain at least one method"),
            RouterError::InvalidMethod(method) => write!(f, "One or more HTTP methods are invalid: {}", method),
            RouterError::InvalidPattern(message) => write!(f, "Invalid route pattern: {}", message),
            RouterError::RouteNotFound(name) => write!(f, "Cannot generate URI for route \"{}\"; route not found", name),
            RouterError::MissingParameters { route, expected, received } => write!(
                f,
                "Route `{}` expects at least parameter values for [{}], but received [{}]",
                route,
                expected.join(","),
                received.join(","),
            ),
            RouterError::ConstraintMismatch { param, constraint } => write!(f, "Parameter value for [{}] did not match the regex `{}`", param, constraint),
            RouterError::CacheDirectoryMissing(dir) => write!(f, "The cache directory \"{}\" does not exist", dir.display()),
            RouterError::CacheDirectoryNotWritable(dir) => write!(f, "The cache directory \"{}\" is not writable", dir.display()),
            RouterError::CacheFileNotWritable(file) => write!(f, "The cache file \"{}\" is not writable", file.display()),
            RouterError::InvalidCacheContents(file, reason) => write!(f, "Invalid cache file \"{}\"; cache file MUST contain a serialized dispatch table ({})", file.display(), reason),
            RouterError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::fmt::Debug for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for RouterError {}

impl From<std::io::Error> for RouterError {
    fn from(err: std::io::Error) -> RouterError {
        RouterError::IoError(err)
    }
}
