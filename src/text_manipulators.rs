use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Serialized markup of `node`, tags included.
pub fn extract_raw(node: ElementRef) -> String {
    node.html()
}

pub fn select_first<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document.select(selector).next()
}

pub fn select_first_in<'a>(node: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    node.select(selector).next()
}

/// Every `<a href>` below `node`, in document order.
pub fn links_in(node: ElementRef) -> Vec<(String, String)> {
    node.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .filter_map(|el| {
            el.value()
                .attr("href")
                .map(|href| (href.trim().to_string(), extract_text(el).trim().to_string()))
        })
        .collect()
}

/// First element below `node` (or `node` itself) with the given tag name.
pub fn find_element<'a>(node: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    node.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag)
}

/// Decodes entities and drops tags from a snippet of raw markup.
pub fn unescape_markup(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    extract_text(fragment.root_element())
}

/// Turns a possibly relative link into an absolute URL string.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(String::from)
}
