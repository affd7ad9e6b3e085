mod enhet;
pub use self::enhet::{Enhet, Naeringskode, Organisasjonsform};

mod page;
pub use self::page::{Embedded, PageInfo, SearchResponse};
