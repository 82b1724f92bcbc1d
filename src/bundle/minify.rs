use anyhow::Result;

/// Text transform applied to each script before it is written to a
/// compressed bundle.
#[cfg_attr(test, mockall::automock)]
pub trait Minifier {
    fn minify(&self, source: &str) -> Result<String>;
}

/// [`Minifier`] backed by the `minifier` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsMinifier;

impl Minifier for JsMinifier {
    fn minify(&self, source: &str) -> Result<String> {
        Ok(minifier::js::minify(source).to_string())
    }
}
