/// Build a [`Fields`](crate::Fields) map from `key => value` pairs.
///
/// ```
/// let defaults = legman_types::fields! { "service" => "api", "pid" => 42 };
/// assert_eq!(defaults.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Fields::new();
        $( map.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        map
    }};
}
