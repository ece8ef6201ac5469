use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, PrintableStringRef, SetOfVec, Utf8StringRef};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use crate::error::{PkiError, Result};

/// countryName (C)
pub const COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
/// stateOrProvinceName (ST)
pub const STATE_OR_PROVINCE_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
/// localityName (L)
pub const LOCALITY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
/// organizationName (O)
pub const ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
/// organizationalUnitName (OU)
pub const ORGANIZATIONAL_UNIT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
/// commonName (CN)
pub const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
/// PKCS#9 unstructuredName
pub const UNSTRUCTURED_NAME: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.2");

/// Distinguished name attributes of a CA, a request or an issued certificate.
///
/// Attributes are emitted as one RDN each, always in the order
/// C, ST, L, O, OU, CN. Absent attributes are omitted.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub common_name: String,
}

impl DistinguishedName {
    fn ordered(&self) -> [(ObjectIdentifier, Option<&str>); 6] {
        [
            (COUNTRY_NAME, self.country.as_deref()),
            (STATE_OR_PROVINCE_NAME, self.state.as_deref()),
            (LOCALITY_NAME, self.locality.as_deref()),
            (ORGANIZATION_NAME, self.organization.as_deref()),
            (ORGANIZATIONAL_UNIT_NAME, self.organizational_unit.as_deref()),
            (COMMON_NAME, Some(self.common_name.as_str())),
        ]
    }

    /// Converts the distinguished name to an X.509 RDN sequence.
    ///
    /// The country is encoded as a PrintableString, every other attribute as
    /// a UTF8String.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::Name> {
        let mut rdns = Vec::new();
        for (oid, value) in self.ordered() {
            let Some(value) = value else { continue };
            let value = encode_attribute_value(oid, value)?;
            let atv = AttributeTypeAndValue { oid, value };
            rdns.push(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?));
        }
        Ok(RdnSequence(rdns))
    }

    /// Reads the known attributes back out of an X.509 name.
    ///
    /// Unknown attribute types are ignored. Fails if a known attribute is
    /// not valid text.
    pub fn from_x509_name(x509dn: &x509_cert::name::Name) -> Result<Self> {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for atv in rdn.0.iter() {
                let slot = match atv.oid {
                    COUNTRY_NAME => &mut dn.country,
                    STATE_OR_PROVINCE_NAME => &mut dn.state,
                    LOCALITY_NAME => &mut dn.locality,
                    ORGANIZATION_NAME => &mut dn.organization,
                    ORGANIZATIONAL_UNIT_NAME => &mut dn.organizational_unit,
                    COMMON_NAME => {
                        dn.common_name = attribute_text(&atv.value)?;
                        continue;
                    }
                    _ => continue,
                };
                *slot = Some(attribute_text(&atv.value)?);
            }
        }

        Ok(dn)
    }
}

fn encode_attribute_value(oid: ObjectIdentifier, value: &str) -> Result<Any> {
    let encoded = if oid == COUNTRY_NAME {
        Any::encode_from(&PrintableStringRef::new(value)?)
    } else {
        Any::encode_from(&Utf8StringRef::new(value)?)
    };
    encoded.map_err(|e| PkiError::InvalidInput(format!("{oid}: {e}")))
}

/// Directory strings in requests arrive as PrintableString, UTF8String or
/// IA5String; all of them carry their text as UTF-8 compatible bytes.
pub(crate) fn attribute_text(value: &Any) -> Result<String> {
    std::str::from_utf8(value.value())
        .map(str::to_owned)
        .map_err(|e| PkiError::DecodingError(e.to_string()))
}

/// Attributes of a certificate signing request.
///
/// `unstructured_name` is carried as a PKCS#9 request attribute, never as a
/// subject RDN, so it does not reach issued certificates.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct RequestAttributes {
    pub subject: DistinguishedName,
    pub unstructured_name: Option<String>,
}

impl From<DistinguishedName> for RequestAttributes {
    fn from(subject: DistinguishedName) -> Self {
        RequestAttributes {
            subject,
            unstructured_name: None,
        }
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// Sub-second precision is dropped since X.509 times carry whole seconds.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        let now = now - Duration::nanoseconds(i64::from(now.nanosecond()));
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }
}
