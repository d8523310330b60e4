use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

use super::BucketError;
use crate::cipher::{self, CipherError, Signable};
use crate::crypto::{PublicKey, SecretKey};

/// A human-readable name bound to a bucket hash by its publisher.
///
/// A domain can be registered once; the record is signed over
/// `hash ++ domain` so peers can check who registered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    hash: String,
    domain: String,
    pubkey: Vec<u8>,
    sig: Vec<u8>,
}

impl DomainRecord {
    pub fn new(hash: &str, domain: &str, publisher: &PublicKey) -> Self {
        Self {
            hash: hash.to_string(),
            domain: domain.to_string(),
            pubkey: publisher.to_bytes().to_vec(),
            sig: Vec::new(),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn publisher(&self) -> Result<PublicKey, BucketError> {
        Ok(PublicKey::try_from(self.pubkey.as_slice())?)
    }

    pub fn sign(&mut self, key: &SecretKey) -> Result<(), BucketError> {
        let mut copy = self.clone();
        copy.sig = cipher::sign(&copy, key)?;
        copy.verify()?;
        self.sig = copy.sig;
        Ok(())
    }

    pub fn verify(&self) -> Result<(), BucketError> {
        cipher::verify(self, &self.publisher()?)?;
        Ok(())
    }
}

impl Signable for DomainRecord {
    fn data(&self) -> Result<Vec<u8>, CipherError> {
        Ok([self.hash.as_bytes(), self.domain.as_bytes()].concat())
    }

    fn signature(&self) -> &[u8] {
        &self.sig
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DomainRecordMessage {
    hash: String,
    domain: String,
    #[serde(rename = "PK")]
    #[serde_as(as = "Base64")]
    pk: Vec<u8>,
    #[serde_as(as = "Base64")]
    sig: Vec<u8>,
}

pub fn parse_domain_record(raw: &[u8]) -> Result<DomainRecord, BucketError> {
    let msg: DomainRecordMessage = serde_json::from_slice(raw)?;
    let record = DomainRecord {
        hash: msg.hash,
        domain: msg.domain,
        pubkey: msg.pk,
        sig: msg.sig,
    };
    record.verify()?;
    Ok(record)
}

pub fn serialize_domain_record(record: &DomainRecord) -> Result<Vec<u8>, BucketError> {
    record.verify()?;
    Ok(serde_json::to_vec(&DomainRecordMessage {
        hash: record.hash.clone(),
        domain: record.domain.clone(),
        pk: record.pubkey.clone(),
        sig: record.sig.clone(),
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = SecretKey::generate();
        let mut record = DomainRecord::new("abcd", "photos.cbn", &key.public());
        assert!(record.verify().is_err());
        record.sign(&key).unwrap();

        let raw = serialize_domain_record(&record).unwrap();
        let parsed = parse_domain_record(&raw).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.domain(), "photos.cbn");
        assert_eq!(parsed.hash(), "abcd");
    }

    #[test]
    fn test_foreign_key_cannot_sign() {
        let key = SecretKey::generate();
        let mut record = DomainRecord::new("abcd", "photos.cbn", &key.public());
        assert!(record.sign(&SecretKey::generate()).is_err());
        assert!(record.verify().is_err());
    }
}
