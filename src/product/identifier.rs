use crate::product::Marketplace;
use crate::IdentifierError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// What the caller handed us to name a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductIdentifier {
    /// The marketplace's numeric article id
    Article(u64),
    /// A catalog URL containing the article id as a path segment
    Url(Url),
}

impl ProductIdentifier {
    /// Resolves the article id this identifier points at
    pub fn article_id(&self) -> Result<u64, IdentifierError> {
        match self {
            Self::Article(article) => Ok(*article),
            Self::Url(url) => extract_article(url),
        }
    }

    /// Marketplace implied by a catalog URL's host
    ///
    /// Bare article ids carry no marketplace and return `Ok(None)`.
    pub fn marketplace(&self) -> Result<Option<Marketplace>, IdentifierError> {
        match self {
            Self::Article(_) => Ok(None),
            Self::Url(url) => {
                let host = url.host_str().unwrap_or_default();
                Marketplace::from_host(host)
                    .map(Some)
                    .ok_or_else(|| IdentifierError::UnknownHost(host.to_string()))
            }
        }
    }
}

impl From<u64> for ProductIdentifier {
    fn from(article: u64) -> Self {
        Self::Article(article)
    }
}

impl FromStr for ProductIdentifier {
    type Err = IdentifierError;

    /// Parses either a bare article id or a catalog URL
    ///
    /// URLs are checked eagerly: the scheme must be http(s) and a numeric
    /// path segment must be present.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricelens::product::ProductIdentifier;
    ///
    /// let id: ProductIdentifier = "288392979".parse().unwrap();
    /// assert_eq!(id.article_id(), Ok(288392979));
    ///
    /// let id: ProductIdentifier = "https://www.wildberries.ru/catalog/85999881/detail.aspx"
    ///     .parse()
    ///     .unwrap();
    /// assert_eq!(id.article_id(), Ok(85999881));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return trimmed
                .parse::<u64>()
                .map(Self::Article)
                .map_err(|_| IdentifierError::MissingArticle(trimmed.to_string()));
        }

        let url = Url::parse(trimmed).map_err(|_| IdentifierError::InvalidUrl(trimmed.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(IdentifierError::InvalidScheme(url.scheme().to_string()));
        }

        extract_article(&url)?;
        Ok(Self::Url(url))
    }
}

impl fmt::Display for ProductIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Article(article) => write!(f, "{}", article),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Extracts the article id from a catalog URL
///
/// The article is the first path segment made only of digits, e.g.
/// `https://www.wildberries.ru/catalog/288392979/detail.aspx`.
pub fn extract_article(url: &Url) -> Result<u64, IdentifierError> {
    url.path_segments()
        .into_iter()
        .flatten()
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .and_then(|segment| segment.parse::<u64>().ok())
        .ok_or_else(|| IdentifierError::MissingArticle(url.to_string()))
}
