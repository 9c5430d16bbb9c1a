//! Markup sanitization for submitted form text.
//!
//! Uses `ammonia`'s default whitelist: harmless formatting tags survive,
//! while `<script>`/`<style>` elements are removed together with their
//! content. Event-handler attributes and `javascript:` URLs are stripped.
//!
//! The result is serialized HTML, so text characters are entity-encoded:
//! `Smith & Sons` is stored as `Smith &amp; Sons` and a bare `<` as `&lt;`.

/// Strip executable markup from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    ammonia::clean(input)
}
