use uuid::Uuid;

/// Length of the public room token handed out to clients.
pub const ROOM_ID_LEN: usize = 8;

/// Short random token used as the external identifier of a room.
pub fn short_room_id() -> String {
  let mut id = Uuid::new_v4().simple().to_string();
  id.truncate(ROOM_ID_LEN);
  id
}

/// Splits a comma separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(str::to_owned)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_room_id_is_eight_hex_chars() {
    let id = short_room_id();
    assert_eq!(id.len(), ROOM_ID_LEN);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn split_list_trims_and_skips_blanks() {
    assert_eq!(
      split_list(" http://a:3000, ,http://b:8000 ,"),
      vec!["http://a:3000".to_owned(), "http://b:8000".to_owned()]
    );
    assert!(split_list("").is_empty());
  }
}
