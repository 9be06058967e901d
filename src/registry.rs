//! The process-wide OID name registry
//!
//! A bidirectional map between canonical dotted OIDs and symbolic names,
//! initialised once on first use and read-only afterwards. Name lookup is
//! insensitive to case, whitespace and dashes. Any registered name of the
//! form `id-XX-rest` also answers to `rest` alone, except that `id-ad-*`
//! answers to `*-IA` and `id-kp-*` to `*-EKU` (the bare forms collide
//! between those two arcs).

use crate::error::CodecError;
use crate::oid::Oid;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Bidirectional OID/name map
#[derive(Debug)]
pub struct OidRegistry {
    names: HashMap<String, String>,
    oids: HashMap<String, String>,
}

static REGISTRY: OnceLock<OidRegistry> = OnceLock::new();

/// The process-wide registry, built on first use.
pub fn registry() -> &'static OidRegistry {
    REGISTRY.get_or_init(|| {
        let reg = OidRegistry::builtin().expect("built-in OID table is consistent");
        log::debug!("OID registry initialised with {} names", reg.oids.len());
        reg
    })
}

/// Strip whitespace and dashes, lowercase ASCII.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn short_alias(name: &str) -> Option<String> {
    let rest = name.strip_prefix("id-")?;
    if rest.len() < 4 || !rest.is_char_boundary(3) {
        return None;
    }
    let arc = rest[..3].strip_suffix('-')?;
    let rest = &rest[3..];
    Some(match arc {
        "ad" => format!("{}-IA", rest),
        "kp" => format!("{}-EKU", rest),
        _ => rest.to_string(),
    })
}

impl OidRegistry {
    fn new() -> OidRegistry {
        OidRegistry {
            names: HashMap::new(),
            oids: HashMap::new(),
        }
    }

    /// Register `name` for `oid`. The first name registered for an OID
    /// becomes its primary name; registering an already-known normalised
    /// name is an error.
    fn register(&mut self, oid: &str, name: &str) -> Result<(), String> {
        let parsed: Oid = oid
            .parse()
            .map_err(|e: CodecError| format!("bad OID {}: {}", oid, e))?;
        let canonical = parsed.to_string();
        let key = normalize_name(name);
        if self.oids.contains_key(&key) {
            return Err(format!("duplicate OID name {}", name));
        }
        self.oids.insert(key, canonical.clone());
        self.names.entry(canonical).or_insert_with(|| name.to_string());
        if let Some(alias) = short_alias(name) {
            let alias_key = normalize_name(&alias);
            if self.oids.contains_key(&alias_key) {
                return Err(format!("duplicate OID alias {}", alias));
            }
            self.oids.insert(alias_key, parsed.to_string());
        }
        Ok(())
    }

    fn builtin() -> Result<OidRegistry, String> {
        let mut reg = OidRegistry::new();
        for &(oid, name) in BUILTIN {
            reg.register(oid, name)?;
        }
        Ok(reg)
    }

    /// The primary name for an OID, or its dotted form when unknown.
    pub fn to_name(&self, oid: &Oid) -> String {
        let canonical = oid.to_string();
        match self.names.get(&canonical) {
            Some(name) => name.clone(),
            None => canonical,
        }
    }

    /// Resolve a registered name to its OID.
    pub fn name_to_oid(&self, name: &str) -> Option<Oid> {
        let canonical = self.oids.get(&normalize_name(name))?;
        canonical.parse().ok()
    }

    /// Resolve either a (possibly non-canonical) numeric OID or a
    /// registered name.
    pub fn to_oid(&self, input: &str) -> Result<Oid, CodecError> {
        if input.starts_with(|c: char| c.is_ascii_digit()) {
            input.parse()
        } else {
            self.name_to_oid(input).ok_or(CodecError::InvalidOid)
        }
    }

    /// Component list for a numeric OID or a registered name.
    pub fn components(&self, input: &str) -> Result<Vec<u64>, CodecError> {
        Ok(self.to_oid(input)?.components().to_vec())
    }
}

#[rustfmt::skip]
static BUILTIN: &[(&str, &str)] = &[
    // X.500 attribute types
    ("2.5.4.3", "id-at-commonName"),
    ("2.5.4.4", "id-at-surname"),
    ("2.5.4.5", "id-at-serialNumber"),
    ("2.5.4.6", "id-at-countryName"),
    ("2.5.4.7", "id-at-localityName"),
    ("2.5.4.8", "id-at-stateOrProvinceName"),
    ("2.5.4.9", "id-at-streetAddress"),
    ("2.5.4.10", "id-at-organizationName"),
    ("2.5.4.11", "id-at-organizationalUnitName"),
    ("2.5.4.12", "id-at-title"),
    ("2.5.4.13", "id-at-description"),
    ("2.5.4.41", "id-at-name"),
    ("2.5.4.42", "id-at-givenName"),
    ("2.5.4.43", "id-at-initials"),
    ("2.5.4.44", "id-at-generationQualifier"),
    ("2.5.4.45", "id-at-x500UniqueIdentifier"),
    ("2.5.4.46", "id-at-dnQualifier"),
    ("2.5.4.65", "id-at-pseudonym"),
    ("0.9.2342.19200300.100.1.1", "id-userId"),
    ("0.9.2342.19200300.100.1.25", "id-domainComponent"),
    // X.509 certificate extensions
    ("2.5.29.9", "id-ce-subjectDirectoryAttributes"),
    ("2.5.29.14", "id-ce-subjectKeyIdentifier"),
    ("2.5.29.15", "id-ce-keyUsage"),
    ("2.5.29.16", "id-ce-privateKeyUsagePeriod"),
    ("2.5.29.17", "id-ce-subjectAltName"),
    ("2.5.29.18", "id-ce-issuerAltName"),
    ("2.5.29.19", "id-ce-basicConstraints"),
    ("2.5.29.20", "id-ce-cRLNumber"),
    ("2.5.29.21", "id-ce-reasonCode"),
    ("2.5.29.24", "id-ce-invalidityDate"),
    ("2.5.29.27", "id-ce-deltaCRLIndicator"),
    ("2.5.29.28", "id-ce-issuingDistributionPoint"),
    ("2.5.29.29", "id-ce-certificateIssuer"),
    ("2.5.29.30", "id-ce-nameConstraints"),
    ("2.5.29.31", "id-ce-cRLDistributionPoints"),
    ("2.5.29.32", "id-ce-certificatePolicies"),
    ("2.5.29.33", "id-ce-policyMappings"),
    ("2.5.29.35", "id-ce-authorityKeyIdentifier"),
    ("2.5.29.36", "id-ce-policyConstraints"),
    ("2.5.29.37", "id-ce-extKeyUsage"),
    ("2.5.29.46", "id-ce-freshestCRL"),
    ("2.5.29.54", "id-ce-inhibitAnyPolicy"),
    // PKIX
    ("1.3.6.1.5.5.7.1.1", "id-pe-authorityInfoAccess"),
    ("1.3.6.1.5.5.7.1.11", "id-pe-subjectInfoAccess"),
    ("1.3.6.1.5.5.7.2.1", "id-qt-cps"),
    ("1.3.6.1.5.5.7.2.2", "id-qt-unotice"),
    ("1.3.6.1.5.5.7.3.1", "id-kp-serverAuth"),
    ("1.3.6.1.5.5.7.3.2", "id-kp-clientAuth"),
    ("1.3.6.1.5.5.7.3.3", "id-kp-codeSigning"),
    ("1.3.6.1.5.5.7.3.4", "id-kp-emailProtection"),
    ("1.3.6.1.5.5.7.3.8", "id-kp-timeStamping"),
    ("1.3.6.1.5.5.7.3.9", "id-kp-OCSPSigning"),
    ("1.3.6.1.5.5.7.48.1", "id-ad-ocsp"),
    ("1.3.6.1.5.5.7.48.2", "id-ad-caIssuers"),
    ("1.3.6.1.5.5.7.48.3", "id-ad-timeStamping"),
    ("1.3.6.1.5.5.7.48.5", "id-ad-caRepository"),
    // PKCS#1
    ("1.2.840.113549.1.1.1", "rsaEncryption"),
    ("1.2.840.113549.1.1.2", "md2WithRSAEncryption"),
    ("1.2.840.113549.1.1.4", "md5WithRSAEncryption"),
    ("1.2.840.113549.1.1.5", "sha1WithRSAEncryption"),
    ("1.2.840.113549.1.1.7", "id-RSAES-OAEP"),
    ("1.2.840.113549.1.1.8", "id-mgf1"),
    ("1.2.840.113549.1.1.10", "id-RSASSA-PSS"),
    ("1.2.840.113549.1.1.11", "sha256WithRSAEncryption"),
    ("1.2.840.113549.1.1.12", "sha384WithRSAEncryption"),
    ("1.2.840.113549.1.1.13", "sha512WithRSAEncryption"),
    ("1.2.840.113549.1.1.14", "sha224WithRSAEncryption"),
    // PKCS#7
    ("1.2.840.113549.1.7.1", "id-data"),
    ("1.2.840.113549.1.7.2", "id-signedData"),
    ("1.2.840.113549.1.7.3", "id-envelopedData"),
    ("1.2.840.113549.1.7.5", "id-digestedData"),
    ("1.2.840.113549.1.7.6", "id-encryptedData"),
    // PKCS#9
    ("1.2.840.113549.1.9.1", "emailAddress"),
    ("1.2.840.113549.1.9.2", "unstructuredName"),
    ("1.2.840.113549.1.9.3", "contentType"),
    ("1.2.840.113549.1.9.4", "messageDigest"),
    ("1.2.840.113549.1.9.5", "signingTime"),
    ("1.2.840.113549.1.9.7", "challengePassword"),
    ("1.2.840.113549.1.9.14", "extensionRequest"),
    // RSADSI digest and MAC algorithms
    ("1.2.840.113549.2.2", "md2"),
    ("1.2.840.113549.2.5", "md5"),
    ("1.2.840.113549.2.7", "hmacWithSHA1"),
    ("1.2.840.113549.2.8", "hmacWithSHA224"),
    ("1.2.840.113549.2.9", "hmacWithSHA256"),
    ("1.2.840.113549.2.10", "hmacWithSHA384"),
    ("1.2.840.113549.2.11", "hmacWithSHA512"),
    // NIST algorithms
    ("2.16.840.1.101.3.4.1.2", "aes128-CBC"),
    ("2.16.840.1.101.3.4.1.6", "aes128-GCM"),
    ("2.16.840.1.101.3.4.1.22", "aes192-CBC"),
    ("2.16.840.1.101.3.4.1.26", "aes192-GCM"),
    ("2.16.840.1.101.3.4.1.42", "aes256-CBC"),
    ("2.16.840.1.101.3.4.1.46", "aes256-GCM"),
    ("2.16.840.1.101.3.4.2.1", "sha256"),
    ("2.16.840.1.101.3.4.2.2", "sha384"),
    ("2.16.840.1.101.3.4.2.3", "sha512"),
    ("2.16.840.1.101.3.4.2.4", "sha224"),
    ("2.16.840.1.101.3.4.2.5", "sha512-224"),
    ("2.16.840.1.101.3.4.2.6", "sha512-256"),
    ("2.16.840.1.101.3.4.2.7", "sha3-224"),
    ("2.16.840.1.101.3.4.2.8", "sha3-256"),
    ("2.16.840.1.101.3.4.2.9", "sha3-384"),
    ("2.16.840.1.101.3.4.2.10", "sha3-512"),
    ("2.16.840.1.101.3.4.3.1", "dsa-with-sha224"),
    ("2.16.840.1.101.3.4.3.2", "dsa-with-sha256"),
    // X9.57
    ("1.2.840.10040.4.1", "dsa"),
    ("1.2.840.10040.4.3", "dsa-with-sha1"),
    // X9.62 / SEC
    ("1.2.840.10045.2.1", "ecPublicKey"),
    ("1.2.840.10045.3.1.1", "prime192v1"),
    ("1.2.840.10045.3.1.7", "prime256v1"),
    ("1.2.840.10045.4.1", "ecdsa-with-SHA1"),
    ("1.2.840.10045.4.3.1", "ecdsa-with-SHA224"),
    ("1.2.840.10045.4.3.2", "ecdsa-with-SHA256"),
    ("1.2.840.10045.4.3.3", "ecdsa-with-SHA384"),
    ("1.2.840.10045.4.3.4", "ecdsa-with-SHA512"),
    ("1.3.132.0.10", "secp256k1"),
    ("1.3.132.0.33", "secp224r1"),
    ("1.3.132.0.34", "secp384r1"),
    ("1.3.132.0.35", "secp521r1"),
    // modern curves
    ("1.3.101.110", "x25519"),
    ("1.3.101.111", "x448"),
    ("1.3.101.112", "ed25519"),
    ("1.3.101.113", "ed448"),
    // OIW
    ("1.3.14.3.2.26", "sha1"),
    ("1.3.14.3.2.29", "sha1WithRSASignature"),
    // Microsoft
    ("1.3.6.1.4.1.311.20.2", "certificateTemplateName"),
    ("1.3.6.1.4.1.311.20.2.3", "userPrincipalName"),
    ("1.3.6.1.4.1.311.21.1", "certSrvCaVersion"),
    ("1.3.6.1.4.1.311.21.7", "certificateTemplate"),
    ("1.3.6.1.4.1.311.21.10", "applicationCertPolicies"),
];
