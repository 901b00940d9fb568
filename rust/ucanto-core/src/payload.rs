//! The UCAN payload: who delegates what to whom, and for how long.

use ipld_core::ipld::Ipld;
use serde::{Deserialize, Serialize};
use ucanto_car::{AsBlock, Hashers, Link, Prefix, hash::SHA2_256, link::DAG_CBOR};

use crate::{Capability, CoreError};

/// The claims of a UCAN token.
///
/// Encoded as a DAG-CBOR map; `nnc` and `nbf` are omitted when absent.
// Field order is the canonical DAG-CBOR key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Capabilities being granted
    pub att: Vec<Capability<Ipld>>,
    /// Audience DID
    pub aud: String,
    /// Expiry, in seconds since the Unix epoch
    pub exp: u64,
    /// Facts asserted alongside the capabilities
    #[serde(default)]
    pub fct: Vec<Ipld>,
    /// Issuer DID
    pub iss: String,
    /// Not valid before, in seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nnc: Option<String>,
    /// Links to the delegations proving the issuer's authority
    #[serde(default)]
    pub prf: Vec<Link>,
}

impl Payload {
    /// A payload with no facts, proofs, nonce or start time.
    pub fn new(
        iss: impl Into<String>,
        aud: impl Into<String>,
        att: Vec<Capability<Ipld>>,
        exp: u64,
    ) -> Self {
        Payload {
            att,
            aud: aud.into(),
            exp,
            fct: Vec::new(),
            iss: iss.into(),
            nbf: None,
            nnc: None,
            prf: Vec::new(),
        }
    }

    pub fn with_proofs(mut self, prf: Vec<Link>) -> Self {
        self.prf = prf;
        self
    }

    pub fn with_facts(mut self, fct: Vec<Ipld>) -> Self {
        self.fct = fct;
        self
    }

    pub fn with_nonce(mut self, nnc: impl Into<String>) -> Self {
        self.nnc = Some(nnc.into());
        self
    }

    pub fn with_not_before(mut self, nbf: u64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|error| CoreError::Encode(error.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        serde_ipld_dagcbor::from_slice(bytes).map_err(|error| CoreError::Decode(error.to_string()))
    }

    /// Encodes the payload and computes its link (dag-cbor, sha2-256),
    /// giving a pair that can be written straight into an archive.
    pub fn to_block(&self) -> Result<(Link, Vec<u8>), CoreError> {
        let bytes = self.to_bytes()?;
        let link = Prefix::v1(DAG_CBOR, SHA2_256).sum(&bytes, &Hashers::default())?;
        Ok((link, bytes))
    }

    /// Decodes a payload from an archive block, after checking that the
    /// block's bytes hash to its link.
    pub fn from_block<B>(block: &B, hashers: &Hashers) -> Result<Self, CoreError>
    where
        B: AsBlock + ?Sized,
    {
        if !block.link().verify(block.data(), hashers)? {
            return Err(CoreError::Mismatch(*block.link()));
        }
        Self::from_bytes(block.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use testresult::TestResult;

    const ALICE: &str = "did:key:z6Mkk89bC3JrVqKie71YEcc5M1SMVxuCgNx6zLZ8SYJsxALi";
    const SPACE: &str = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
    const SERVICE: &str = "did:web:up.storacha.network";

    fn payload() -> Payload {
        let nb = Ipld::Map(BTreeMap::from([("size".to_string(), Ipld::Integer(1024))]));
        Payload::new(
            ALICE,
            SERVICE,
            vec![Capability::new("store/add", SPACE, nb)],
            1_700_000_000,
        )
    }

    #[test]
    fn it_encodes_keys_in_canonical_order() -> TestResult {
        let bytes = payload().to_bytes()?;

        // Six entries (nbf and nnc omitted), "att" first
        assert_eq!(&bytes[..5], &[0xa6, 0x63, b'a', b't', b't']);
        assert_eq!(Payload::from_bytes(&bytes)?, payload());
        Ok(())
    }

    #[test]
    fn it_links_to_its_encoded_bytes() -> TestResult {
        let (link, bytes) = payload().to_block()?;

        assert_eq!(link.codec(), DAG_CBOR);
        assert_eq!(link.multihash_code(), SHA2_256);
        assert!(link.verify(&bytes, &Hashers::default())?);
        assert!(link.to_string().starts_with("bafyrei"));
        Ok(())
    }

    #[test]
    fn it_carries_optional_claims() -> TestResult {
        let (proof, _) = payload().to_block()?;
        let payload = payload()
            .with_proofs(vec![proof])
            .with_facts(vec![Ipld::String("fact".into())])
            .with_nonce("abc")
            .with_not_before(1_600_000_000);

        let decoded = Payload::from_bytes(&payload.to_bytes()?)?;
        assert_eq!(decoded.prf, vec![proof]);
        assert_eq!(decoded.nnc.as_deref(), Some("abc"));
        assert_eq!(decoded.nbf, Some(1_600_000_000));
        assert_eq!(decoded, payload);
        Ok(())
    }

    #[test]
    fn it_refuses_blocks_that_do_not_match_their_link() -> TestResult {
        let hashers = Hashers::default();
        let (link, bytes) = payload().to_block()?;
        assert_eq!(Payload::from_block(&(link, bytes.as_slice()), &hashers)?, payload());

        let (other, _) = payload().with_nonce("other").to_block()?;
        let result = Payload::from_block(&(other, bytes), &hashers);
        assert!(matches!(result, Err(CoreError::Mismatch(found)) if found == other));
        Ok(())
    }

    #[test]
    fn it_reports_undecodable_bytes() {
        assert!(matches!(
            Payload::from_bytes(&[0xa1, 0x63]),
            Err(CoreError::Decode(_))
        ));
    }
}
