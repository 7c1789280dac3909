#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$crate::floor_char_boundary(&$query, 497)].trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Largest char boundary of `value` that is not past `index`.
pub fn floor_char_boundary(value: &str, index: usize) -> usize {
    if index >= value.len() {
        return value.len();
    }
    let mut index = index;
    while !value.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Logs the error and returns it, for use in `map_err` chains.
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {{
        let error = $error;
        log::error!("{:#}", error);
        error
    }};
}

/// Splits a `scheme://rest` url into its scheme, if it has one.
pub fn url_scheme(url: &str) -> Option<&str> {
    url.split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty())
}
