//! Defensive response-body decoding.
//!
//! Some proxies and runtimes strip or mislabel `content-encoding`, handing
//! back bodies the native JSON path cannot parse even though they are valid
//! compressed JSON. Decoding therefore runs in two tiers: a plain JSON parse
//! first, then manual decompression matching the declared (or sniffed)
//! encoding, then JSON again.

use std::io::Read;

use serde_json::Value;

use crate::error::ApiError;
use crate::transport::RawResponse;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes a raw response body into JSON, falling back to manual
/// gzip/deflate decompression for bodies the native path cannot parse.
pub fn decode_body(response: &RawResponse, accepted_encodings: &[String]) -> Result<Value, ApiError> {
    if let Ok(value) = serde_json::from_slice::<Value>(&response.body) {
        return Ok(value);
    }

    if let Some(encoding) = effective_encoding(response, accepted_encodings) {
        if let Ok(decompressed) = decompress(&response.body, encoding) {
            if let Ok(value) = serde_json::from_slice::<Value>(&decompressed) {
                return Ok(value);
            }
        }
    }

    Err(decode_error(response))
}

/// The encoding worth attempting: the declared header when it names a known
/// codec, otherwise a magic-byte sniff for bodies with a stripped header.
fn effective_encoding<'a>(
    response: &'a RawResponse,
    accepted_encodings: &'a [String],
) -> Option<&'a str> {
    if let Some(declared) = response.header("content-encoding") {
        let declared = declared.trim().to_ascii_lowercase();
        return accepted_encodings
            .iter()
            .find(|accepted| accepted.eq_ignore_ascii_case(&declared))
            .map(String::as_str);
    }

    if response.body.starts_with(&GZIP_MAGIC) {
        return accepted_encodings
            .iter()
            .find(|accepted| accepted.eq_ignore_ascii_case("gzip"))
            .map(String::as_str);
    }

    None
}

fn decompress(body: &[u8], encoding: &str) -> Result<Vec<u8>, std::io::Error> {
    match encoding {
        "gzip" => {
            let mut decoder = flate2::read::GzDecoder::new(body);
            let mut output = Vec::new();
            decoder.read_to_end(&mut output)?;
            Ok(output)
        }
        "deflate" => {
            // Servers disagree on whether "deflate" means zlib-wrapped or
            // raw streams; try the wrapped form first.
            let mut decoder = flate2::read::ZlibDecoder::new(body);
            let mut output = Vec::new();
            if decoder.read_to_end(&mut output).is_ok() {
                return Ok(output);
            }

            let mut decoder = flate2::read::DeflateDecoder::new(body);
            let mut output = Vec::new();
            decoder.read_to_end(&mut output)?;
            Ok(output)
        }
        other => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unsupported content-encoding '{other}'"),
        )),
    }
}

fn decode_error(response: &RawResponse) -> ApiError {
    ApiError::decode(
        "response body is not valid JSON after decompression attempts",
        serde_json::json!({
            "content_type": response.header("content-type"),
            "content_length": response.body.len(),
            "content_encoding": response.header("content-encoding"),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(bytes).expect("gzip write");
        encoder.finish().expect("gzip finish")
    }

    fn accepted() -> Vec<String> {
        vec![String::from("gzip"), String::from("deflate")]
    }

    #[test]
    fn plain_json_decodes_natively() {
        let response = RawResponse::ok(br#"{"code":0,"msg":"ok"}"#.to_vec());
        let value = decode_body(&response, &accepted()).expect("plain json");
        assert_eq!(value["code"], json!(0));
    }

    #[test]
    fn declared_gzip_body_falls_back_to_manual_decompression() {
        let body = gzip(br#"{"code":0,"msg":"ok","data":{"x":1}}"#);
        let response =
            RawResponse::ok(body).with_header("content-encoding", "gzip");

        let value = decode_body(&response, &accepted()).expect("gzip fallback");
        assert_eq!(value["data"]["x"], json!(1));
    }

    #[test]
    fn stripped_header_is_recovered_by_magic_sniff() {
        let body = gzip(br#"{"code":0,"msg":"ok"}"#);
        let response = RawResponse::ok(body);

        let value = decode_body(&response, &accepted()).expect("sniffed gzip");
        assert_eq!(value["msg"], json!("ok"));
    }

    #[test]
    fn zlib_deflate_body_decodes() {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(br#"{"code":0,"msg":"ok"}"#).expect("zlib write");
        let body = encoder.finish().expect("zlib finish");

        let response = RawResponse::ok(body).with_header("content-encoding", "deflate");
        let value = decode_body(&response, &accepted()).expect("deflate fallback");
        assert_eq!(value["code"], json!(0));
    }

    #[test]
    fn unparseable_body_yields_decode_error_with_diagnostics() {
        let response = RawResponse::ok(b"<html>gateway error</html>".to_vec())
            .with_header("content-type", "text/html")
            .with_header("content-encoding", "br");

        let error = decode_body(&response, &accepted()).expect_err("must fail");
        assert_eq!(error.kind(), ErrorKind::Decode);

        let diagnostics = error.data().expect("diagnostics");
        assert_eq!(diagnostics["content_type"], json!("text/html"));
        assert_eq!(diagnostics["content_encoding"], json!("br"));
        assert_eq!(diagnostics["content_length"], json!(26));
    }

    #[test]
    fn encoding_outside_the_accepted_list_is_not_attempted() {
        let body = gzip(br#"{"code":0,"msg":"ok"}"#);
        let response = RawResponse::ok(body).with_header("content-encoding", "gzip");

        let error = decode_body(&response, &[String::from("deflate")]).expect_err("must fail");
        assert_eq!(error.kind(), ErrorKind::Decode);
    }
}
