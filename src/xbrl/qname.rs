use once_cell::sync::Lazy;
use std::collections::HashSet;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use url::Url;

use super::model::QName;

/// Hosts that publish the recognised base taxonomies. Anything else is filer
/// supplied.
pub static BASE_TAXONOMY_HOSTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["xbrl.ifrs.org", "www.esma.europa.eu", "xbrl.frc.org.uk"]
        .into_iter()
        .collect()
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum Arcrole {
    #[strum(serialize = "http://www.xbrl.org/2003/arcrole/parent-child")]
    ParentChild,
    #[strum(serialize = "http://xbrl.org/int/dim/arcrole/domain-member")]
    DomainMember,
    #[strum(serialize = "http://xbrl.org/int/dim/arcrole/dimension-domain")]
    DimensionDomain,
    #[strum(serialize = "http://xbrl.org/int/dim/arcrole/hypercube-dimension")]
    HypercubeDimension,
    #[strum(serialize = "http://www.esma.europa.eu/xbrl/esef/arcrole/wider-narrower")]
    WiderNarrower,
}

impl Arcrole {
    pub fn uri(self) -> &'static str {
        self.into()
    }

    pub fn is_dimensional(self) -> bool {
        matches!(
            self,
            Arcrole::DomainMember | Arcrole::DimensionDomain | Arcrole::HypercubeDimension
        )
    }
}

/// True iff `qname` lives in a base taxonomy namespace.
///
/// Only the namespace host is consulted, so the prefix a filer chose has no
/// bearing on the answer.
pub fn is_base(qname: &QName) -> bool {
    is_base_uri(&qname.namespace)
}

pub fn is_extension(qname: &QName) -> bool {
    !is_base(qname)
}

/// True iff the URI's host is one of [`BASE_TAXONOMY_HOSTS`].
pub fn is_base_uri(uri: &str) -> bool {
    Url::parse(uri)
        .ok()
        .and_then(|url| url.host_str().map(|h| BASE_TAXONOMY_HOSTS.contains(h)))
        .unwrap_or(false)
}
