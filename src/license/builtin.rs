use crate::license::{Conformance, LicenseDescriptor};

/// The built-in license set used when no external source is configured.
///
/// Titles are translated when the descriptors are normalized into records,
/// not here.
pub fn descriptors() -> Vec<LicenseDescriptor> {
    vec![
        LicenseDescriptor {
            is_generic: true,
            ..base("notspecified", "License not specified")
        },
        LicenseDescriptor {
            domain_data: true,
            od_conformance: Conformance::Approved,
            url: open_definition_url("odc-pddl"),
            ..base(
                "odc-pddl",
                "Open Data Commons Public Domain Dedication and License (PDDL)",
            )
        },
        LicenseDescriptor {
            domain_data: true,
            od_conformance: Conformance::Approved,
            url: open_definition_url("odc-odbl"),
            ..base("odc-odbl", "Open Data Commons Open Database License (ODbL)")
        },
        LicenseDescriptor {
            domain_data: true,
            od_conformance: Conformance::Approved,
            url: open_definition_url("odc-by"),
            ..base("odc-by", "Open Data Commons Attribution License")
        },
        LicenseDescriptor {
            domain_content: true,
            domain_data: true,
            od_conformance: Conformance::Approved,
            url: open_definition_url("cc-zero"),
            ..base("cc-zero", "Creative Commons CCZero")
        },
        LicenseDescriptor {
            od_conformance: Conformance::Approved,
            url: open_definition_url("cc-by"),
            ..base("cc-by", "Creative Commons Attribution")
        },
        LicenseDescriptor {
            domain_content: true,
            od_conformance: Conformance::Approved,
            url: open_definition_url("cc-by-sa"),
            ..base("cc-by-sa", "Creative Commons Attribution Share-Alike")
        },
        LicenseDescriptor {
            domain_content: true,
            od_conformance: Conformance::Approved,
            url: open_definition_url("gfdl"),
            ..base("gfdl", "GNU Free Documentation License")
        },
        LicenseDescriptor {
            domain_content: true,
            is_generic: true,
            od_conformance: Conformance::Approved,
            ..base("other-open", "Other (Open)")
        },
        LicenseDescriptor {
            domain_content: true,
            is_generic: true,
            od_conformance: Conformance::Approved,
            ..base("other-pd", "Other (Public Domain)")
        },
        LicenseDescriptor {
            domain_content: true,
            is_generic: true,
            od_conformance: Conformance::Approved,
            ..base("other-at", "Other (Attribution)")
        },
        LicenseDescriptor {
            domain_content: true,
            od_conformance: Conformance::Approved,
            url: "http://reference.data.gov.uk/id/open-government-licence".to_string(),
            ..base("uk-ogl", "UK Open Government Licence (OGL)")
        },
        LicenseDescriptor {
            url: "http://creativecommons.org/licenses/by-nc/2.0/".to_string(),
            ..base("cc-nc", "Creative Commons Non-Commercial (Any)")
        },
        LicenseDescriptor {
            is_generic: true,
            ..base("other-nc", "Other (Non-Commercial)")
        },
        LicenseDescriptor {
            is_generic: true,
            ..base("other-closed", "Other (Not Open)")
        },
    ]
}

/// Baseline for a built-in descriptor: not reviewed against either
/// definition until stated otherwise.
fn base(id: &str, title: &str) -> LicenseDescriptor {
    LicenseDescriptor {
        id: id.to_string(),
        title: title.to_string(),
        od_conformance: Conformance::NotReviewed,
        osd_conformance: Conformance::NotReviewed,
        ..LicenseDescriptor::default()
    }
}

fn open_definition_url(id: &str) -> String {
    format!("http://www.opendefinition.org/licenses/{}", id)
}
