
use crate::{HttpHeader, HttpHeaders};

#[test]
pub fn header_updates_stay_unique() {
    let names = ["Accept", "accept", "ACCEPT", "X-Id", "x-id", "Accept"];
    let mut headers = HttpHeaders::new();
    for (index, name) in names.iter().enumerate() {
        headers.update(HttpHeader::new(*name, index.to_string()));
        let mut lowered: Vec<String> = headers.iter().map(|h| h.name().to_lowercase()).collect();
        lowered.sort();
        lowered.dedup();
        assert_eq!(lowered.len(), headers.len());
        assert_eq!(headers.value(name), Some(index.to_string().as_str()));
    }
    assert_eq!(headers.len(), 2);
}
