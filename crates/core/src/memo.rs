//! # スキャンメモ
//!
//! メモのペイロードは `item公開鍵,scanner公開鍵,緯度,経度` の4フィールド。
//! RPCが返すメモは `[長さ] 本文` の形式で、本文がJSON文字列として
//! 引用符で囲まれている場合もある。
//!
//! パースは寛容に行い、形式に合わないメモはエラーではなくNoneとして除外する。

use scantrail_types::LocationRecord;

/// パース済みのスキャンメモ。
#[derive(Debug, Clone, PartialEq)]
pub struct ScanMemo {
    /// アイテムの公開鍵
    pub item_public_key: String,
    /// スキャナーの公開鍵
    pub scanner_public_key: String,
    /// 緯度
    pub latitude: f64,
    /// 経度
    pub longitude: f64,
}

impl ScanMemo {
    /// トランザクションの署名とブロック時刻を付与して位置情報レコードにする。
    pub fn into_record(self, signature: &str, block_time: Option<i64>) -> LocationRecord {
        LocationRecord {
            latitude: self.latitude,
            longitude: self.longitude,
            item_public_key: self.item_public_key,
            scanner_public_key: self.scanner_public_key,
            timestamp: block_time.unwrap_or_default(),
            signature: signature.to_string(),
        }
    }
}

/// メモ文字列をパースする。
///
/// フィールド数が4でない、公開鍵が空、座標が数値でない・範囲外の場合はNone。
pub fn parse_memo(raw: &str) -> Option<ScanMemo> {
    let body = unquote(strip_length_prefix(raw.trim()));

    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    let [item, scanner, latitude, longitude] = fields.as_slice() else {
        return None;
    };
    if item.is_empty() || scanner.is_empty() {
        return None;
    }

    let latitude: f64 = latitude.parse().ok()?;
    let longitude: f64 = longitude.parse().ok()?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(ScanMemo {
        item_public_key: item.to_string(),
        scanner_public_key: scanner.to_string(),
        latitude,
        longitude,
    })
}

/// `[N] ` プレフィックスを取り除く。
fn strip_length_prefix(memo: &str) -> &str {
    if let Some(rest) = memo.strip_prefix('[') {
        if let Some((len, body)) = rest.split_once(']') {
            if !len.is_empty() && len.bytes().all(|b| b.is_ascii_digit()) {
                return body.trim_start();
            }
        }
    }
    memo
}

/// JSON文字列として引用符で囲まれていれば中身を取り出す。
fn unquote(body: &str) -> String {
    if body.len() >= 2 && body.starts_with('"') && body.ends_with('"') {
        return serde_json::from_str::<String>(body)
            .unwrap_or_else(|_| body[1..body.len() - 1].to_string());
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4フィールドの正しいメモから位置情報レコードが得られることを確認
    #[test]
    fn test_parse_well_formed_memo() {
        let memo = parse_memo("\"itemPubKeyX,scannerPubKeyY,37.7749,-122.4194\"").unwrap();
        let record = memo.into_record("5sig", Some(1_700_000_000));

        assert_eq!(record.latitude, 37.7749);
        assert_eq!(record.longitude, -122.4194);
        assert_eq!(record.item_public_key, "itemPubKeyX");
        assert_eq!(record.scanner_public_key, "scannerPubKeyY");
        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.signature, "5sig");
    }

    /// RPCの長さプレフィックス付き・引用符なしのメモも受け付ける
    #[test]
    fn test_parse_rpc_memo_forms() {
        let quoted = parse_memo("[47] \"itemPubKeyX,scannerPubKeyY,37.7749,-122.4194\"").unwrap();
        let bare = parse_memo("[45] itemPubKeyX,scannerPubKeyY,37.7749,-122.4194").unwrap();
        let plain = parse_memo("itemPubKeyX, scannerPubKeyY, 37.7749, -122.4194").unwrap();
        assert_eq!(quoted, bare);
        assert_eq!(bare, plain);
    }

    /// フィールド数が4でないメモは除外される
    #[test]
    fn test_wrong_field_count_is_dropped() {
        assert!(parse_memo("\"a,b,1.0\"").is_none());
        assert!(parse_memo("\"a,b,1.0,2.0,extra\"").is_none());
        assert!(parse_memo("\"a,b,,1.0,2.0\"").is_none());
        assert!(parse_memo("").is_none());
        assert!(parse_memo("hello world").is_none());
    }

    /// 座標が数値でない、範囲外、公開鍵が空のメモは除外される
    #[test]
    fn test_malformed_fields_are_dropped() {
        assert!(parse_memo("a,b,north,2.0").is_none());
        assert!(parse_memo("a,b,91.0,2.0").is_none());
        assert!(parse_memo("a,b,1.0,-181.0").is_none());
        assert!(parse_memo(",b,1.0,2.0").is_none());
        assert!(parse_memo("a,b,NaN,2.0").is_none());
    }

    /// ブロック時刻が無い場合のタイムスタンプは0
    #[test]
    fn test_missing_block_time() {
        let record = parse_memo("a,b,1.5,2.5").unwrap().into_record("sig", None);
        assert_eq!(record.timestamp, 0);
    }

    /// 緯度±90・経度±180ちょうどの座標は範囲内として受け付ける
    #[test]
    fn test_coordinate_bounds_are_inclusive() {
        for (memo, latitude, longitude) in [
            ("a,b,90,180", 90.0, 180.0),
            ("a,b,-90,-180", -90.0, -180.0),
            ("a,b,90.0,-180.0", 90.0, -180.0),
        ] {
            let parsed = parse_memo(memo).unwrap();
            assert_eq!(parsed.latitude, latitude);
            assert_eq!(parsed.longitude, longitude);
        }
        assert!(parse_memo("a,b,90.0001,0").is_none());
        assert!(parse_memo("a,b,0,-180.0001").is_none());
    }
}
