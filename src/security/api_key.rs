use crate::context::RequestContext;
use crate::spec::{ApiKeyLocation, ApiKeyScheme};

impl ApiKeyScheme {
    /// Extract the key from the declared header (case-insensitive) or query
    /// parameter. Empty values count as absent.
    #[must_use]
    pub fn resolve_credential<'a>(&self, ctx: &'a RequestContext) -> Option<&'a str> {
        let value = match self.location {
            ApiKeyLocation::Header => ctx.get_header(&self.name),
            ApiKeyLocation::Query => ctx.get_query(&self.name),
        };
        value.filter(|v| !v.is_empty())
    }
}
