//! Grouped-by-country query shared by both sweeps.

use papertrail_core::{normalize_country_code, Result};
use papertrail_fetch::query::{INSTITUTION_COUNTRY, PARAM_GROUP_BY, PARAM_PER_PAGE, WORKS};
use papertrail_fetch::{CatalogClient, Filter};

/// Works matching `filter`, counted per institution country.
///
/// Country keys come back normalized. An empty list means the catalog found
/// no works; a failed query is an `Err`.
pub async fn fetch_country_groups(
    client: &CatalogClient,
    filter: &Filter,
    page_size: u32,
) -> Result<Vec<(String, u64)>> {
    let response = client
        .perform(
            WORKS,
            filter,
            &[
                (PARAM_GROUP_BY, INSTITUTION_COUNTRY.to_string()),
                (PARAM_PER_PAGE, page_size.to_string()),
            ],
        )
        .await?;

    Ok(response
        .groups()?
        .iter()
        .map(|g| (normalize_country_code(g.key.as_deref()), g.count))
        .collect())
}
