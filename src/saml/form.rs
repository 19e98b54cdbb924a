use scraper::{Html, Selector};

/// Returns the `value` of the first `SAMLResponse` input of the document.
pub fn extract_saml_response(document: &str) -> Option<String> {
    let doc = Html::parse_document(document);
    let selector =
        Selector::parse("input[name=\"SAMLResponse\"]").expect("SAMLResponse selector is valid");

    let element = doc.select(&selector).next()?;
    trace!("extract_saml_response.found_input");

    element.value().attr("value").map(|v| v.into())
}
