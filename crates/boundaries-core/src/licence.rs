//! Licence texts a jurisdiction's `LICENSE.txt` must reproduce, keyed by the
//! definition's `licence_url`.

use std::sync::LazyLock;

use regex::Regex;

/// What a `LICENSE.txt` must contain for a given licence URL.
#[derive(Debug, Clone, Copy)]
pub enum LicenceTerms {
    Exact(&'static str),
    Pattern(&'static Regex),
}

/// Result of comparing a `LICENSE.txt` with its licence terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenceCheck {
    /// No terms are recorded for the licence URL.
    Unknown,
    Matches,
    Mismatch,
}

/// Licences that need a specific attribution, in addition to those listed in
/// the open data catalog.
pub const LICENCES_WITH_TEMPLATES: &[&str] = &[
    // Open data licences.
    "http://geonb.snb.ca/downloads/documents/geonb_license_e.pdf",
    "http://www.elections.bc.ca/docs/EBC-Open-Data-Licence.pdf",
    "http://www.electionspei.ca/apilicense",
    // Some rights reserved.
    "http://mli2.gov.mb.ca/app/register/app/index.php",
    "http://www.electionsquebec.qc.ca/francais/conditions-d-utilisation-de-notre-site-web.php",
    "https://www.geosask.ca/Portal/jsp/terms_popup.jsp",
];

/// Licences under which data is distributed by permission only.
pub const ALL_RIGHTS_RESERVED_LICENCES: &[&str] = &[
    // Open data licence pending.
    "http://opendata-saskatoon.cloudapp.net/TermsOfUse/TermsOfUse",
    "http://www.elections.on.ca/en/voting-in-ontario/electoral-districts/electoral-districts--maps--shapefiles-and-street-index-guide/limited-use-data-product-licence-agreement.html",
];

static ALL_RIGHTS_RESERVED_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^Distributed with permission from .+?\.  Please direct licensing inquiries and requests to:\n\n(.+)",
    )
    .expect("static pattern")
});

static PATTERN_TERMS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        // Creative Commons.
        (
            "http://donnees.ville.quebec.qc.ca/licence.aspx",
            r"^I\. Terms of Use\. This material is licensed under a Creative Commons Attribution 4\.0 International License\. To view a copy of this license, visit http://creativecommons\.org/licenses/by/4\.0/legalcode\. It is attributed to .+, and the original version can be found at .+\.$",
        ),
        (
            "https://www.geosask.ca/Portal/jsp/terms_popup.jsp",
            r"^Attribution: (Source|Adapted from): Her Majesty In Right Of Saskatchewan or Information Services Corporation of Saskatchewan, [^.]+\. The incorporation of data sourced from Her Majesty In Right Of Saskatchewan and/or Information Services Corporation of Saskatchewan, within this product shall not be construed as constituting an endorsement by Her Majesty In Right Of Saskatchewan or Information Services Corporation of Saskatchewan of such product\.$",
        ),
    ]
    .into_iter()
    .map(|(url, pattern)| (url, Regex::new(pattern).expect("static pattern")))
    .collect()
});

const EXACT_TERMS: &[(&str, &str)] = &[
    (
        "http://www.citywindsor.ca/opendata/Documents/OpenDataTermsofUse.pdf",
        r#"I. Terms of Use. This work is provided under the terms of “City of Windsor – Terms of Use” (http://www.citywindsor.ca/opendata/Documents/OpenDataTermsofUse.pdf).  Any use of the work other than as authorized under these terms is strictly prohibited."#,
    ),
    (
        "http://www.electionsquebec.qc.ca/francais/conditions-d-utilisation-de-notre-site-web.php",
        r#"Attribution: This data is provided by the Directeur général des élections du Québec (http://www.electionsquebec.qc.ca), reproduced according to the terms of the "Conditions d'utilisation de notre site Web" (http://www.electionsquebec.qc.ca/francais/conditions-d-utilisation-de-notre-site-web.php). Copyright in the work belongs to the Government of Quebec."#,
    ),
    (
        "http://www5.mississauga.ca/research_catalogue/CityofMississauga_TermsofUse.pdf",
        r#"I. Terms of Use. This work is provided under the terms of “City of Mississauga – Terms of Use” (http://www.mississauga.ca/file/COM/CityOfMississaugaTermsOfUse.pdf).  Any use of the work other than as authorized under these terms is strictly prohibited."#,
    ),
    (
        "https://www.edmonton.ca/city_government/documents/Web-version2.1-OpenDataAgreement.pdf",
        r#"I. Terms of Use. This work is provided under the terms of City of Edmonton Open Data Terms of Use (https://www.edmonton.ca/city_government/documents/Web-version2.1-OpenDataAgreement.pdf).  Any use of the work other than as authorized under these terms is strictly prohibited."#,
    ),
    (
        "http://www.burlington.ca/en/services-for-you/resources/Ongoing_Projects/Open_Data/OpenDataBurlingtonTermsOfUseSeptember192011.pdf",
        r#"I. Terms of Use. This work is provided under the terms of “Terms of Use for Open Data Burlington” (http://www.burlington.ca/en/services-for-you/resources/Ongoing_Projects/Open_Data/OpenDataBurlingtonTermsOfUseSeptember192011.pdf).  Any use of the work other than as authorized under these terms is strictly prohibited."#,
    ),
    (
        "http://geonb.snb.ca/downloads/documents/geonb_license_e.pdf",
        "I. Attribution. This data is provided by GeoNB – www.snb.ca/geonb. This attribution does not constitute an endorsement by Service New Brunswick or its GeoNB partners.\n\nII. Warranty, Liability, Indemnity of Service New Brunswick and its GeoNB partners.\n1. Except as expressly provided in the “GeoNB License Agreement” (http://geonb.snb.ca/downloads/documents/geonb_license_e.pdf), this data is provided “As is” without any representations, warranties, guarantees or conditions, of any kind, whether expressed or implied, statutory or otherwise.\n2. Service New Brunswick (SNB) makes no representation or warranty of any kind with respect to the accuracy, usefulness, novelty, validity, scope, completeness or currency of the data and expressly disclaims any implied warranty of merchantability or fitness for a particular purpose of the data. SNB does not ensure or warrant compatibility with past, current or future versions of your browser to access the data.\n3. The Licensee shall have no recourse against SNB, nor its GeoNB partners, whether by way of any suit or action, for any loss, liability, damage or cost that the Licensee may suffer or incur at any time, by reason of the Licensee’s possession or use of the data.\n4. The Licensee shall indemnify SNB, and its GeoNB partners, and their officers, employees, agents and contractors from all claims alleging loss, costs, expenses, damages or injuries (including injuries resulting in death) arising out of the Licensee’s possession or use of the data.\n5. The Licensee shall license all individuals (or companies) who obtain data or derivative products from the Licensee the right to use the data or derivative products by way of a license agreement, and that agreement shall impose upon these individuals (or companies) the same terms and conditions as those contained in Section II of this agreement.\n6. The Licensee’s liability to indemnify SNB under this agreement shall not affect or prejudice SNB from exercising any other rights under law.\n7. SNB assumes no obligation to update the data. The data may be changed without notice to the Licensee.",
    ),
    (
        "http://www.london.ca/city-hall/open-data/Pages/OpenData-TermsofUse.aspx",
        r#"I. Terms of Use. This work is provided under the terms of “Open Data London – Terms of Use” (http://www.london.ca/city-hall/open-data/Pages/OpenData-TermsofUse.aspx).  Any use of the work other than as authorized under these terms is strictly prohibited."#,
    ),
    (
        "http://data.brantford.opendata.arcgis.com/",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – Brantford (http://data.brantford.opendata.arcgis.com/)."#,
    ),
    (
        "http://geonb.snb.ca/documents/license/geonb-odl_en.pdf",
        r#"I. Terms of Use. Contains information licenced under the GeoNB Open Data Licence (http://geonb.snb.ca/documents/license/geonb-odl_en.pdf)."#,
    ),
    (
        "http://novascotia.ca/opendata/licence.asp",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – Nova Scotia (http://novascotia.ca/opendata/licence.asp)."#,
    ),
    (
        "http://oakville.ca/data/open_data_licence.html",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence — Town of Oakville (http://oakville.ca/data/open_data_licence.html)."#,
    ),
    (
        "http://open.canada.ca/en/open-government-licence-canada",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – Canada (http://open.canada.ca/en/open-government-licence-canada)."#,
    ),
    (
        "http://opendata.haldimandcounty.on.ca/",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – Haldimand County (http://opendata.haldimandcounty.on.ca/)."#,
    ),
    (
        "http://ottawa.ca/en/city-hall/get-know-your-city/open-data#open-data-licence-version-2-0",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – City of Ottawa (http://ottawa.ca/en/city-hall/get-know-your-city/open-data#open-data-licence-version-2-0)."#,
    ),
    (
        "http://www.countygp.ab.ca/EN/main/community/maps-gis/open-data/open-data-licence.html",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – County of Grande Prairie (http://www.countygp.ab.ca/EN/main/community/maps-gis/open-data/open-data-licence.html)."#,
    ),
    (
        "http://www.elections.bc.ca/docs/EBC-Open-Data-Licence.pdf",
        r#"I. Terms of Use. Contains information licenced under the Elections BC Open Data Licence (http://www.elections.bc.ca/docs/EBC-Open-Data-Licence.pdf)."#,
    ),
    (
        "http://www.halifax.ca/opendata/OD_TermsOfUse.php",
        r#"I. Terms of Use. Contains information licenced under the Open Government Licence - Halifax (http://www.halifax.ca/opendata/OD_TermsOfUse.php)."#,
    ),
    (
        "http://www.nanaimo.ca/EN/main/departments/106/DataCatalogue/Licence.html",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence - Nanaimo (http://www.nanaimo.ca/EN/main/departments/106/DataCatalogue/Licence.html)."#,
    ),
    (
        "http://www.newmarket.ca/TownGovernment/Documents/Newmarket_OpenData_Licence.pdf",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence - Town of Newmarket (http://www.newmarket.ca/TownGovernment/Documents/Newmarket_OpenData_Licence.pdf)."#,
    ),
    (
        "http://www.regina.ca/residents/open-government/open-government-licence/",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – City of Regina (http://www.regina.ca/residents/open-government/open-government-licence/)."#,
    ),
    (
        "http://www1.toronto.ca/wps/portal/contentonly?vgnextoid=4a37e03bb8d1e310VgnVCM10000071d60f89RCRD",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – Toronto (http://www1.toronto.ca/wps/portal/contentonly?vgnextoid=4a37e03bb8d1e310VgnVCM10000071d60f89RCRD)."#,
    ),
    (
        "http://www2.gnb.ca/content/dam/gnb/Departments/gs-sg/pdf/OpenDataPolicy.pdf",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – New Brunswick (http://www2.gnb.ca/content/dam/gnb/Departments/gs-sg/pdf/OpenDataPolicy.pdf)."#,
    ),
    (
        "https://data.calgary.ca/stories/s/u45n-7awa",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – City of Calgary (https://data.calgary.ca/stories/s/u45n-7awa)."#,
    ),
    (
        "https://data.strathcona.ca/licence",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – Strathcona County (https://data.strathcona.ca/licence)."#,
    ),
    (
        "https://data.winnipeg.ca/open-data-licence",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – Winnipeg (https://data.winnipeg.ca/open-data-licence)."#,
    ),
    (
        "https://niagaraopendata.ca/pages/open-government-license-2-0-city-of-welland",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence — City of Welland (https://niagaraopendata.ca/pages/open-government-license-2-0-city-of-welland)."#,
    ),
    (
        "https://niagaraopendata.ca/pages/open-government-license-2-0-grimsby",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence — Town of Grimsby (https://niagaraopendata.ca/pages/open-government-license-2-0-grimsby)."#,
    ),
    (
        "https://niagaraopendata.ca/pages/open-government-license-2-0-the-corporation-of-the-city-of-st-catharines",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence — The Corporation of the City of St. Catharines (https://niagaraopendata.ca/pages/open-government-license-2-0-the-corporation-of-the-city-of-st-catharines)."#,
    ),
    (
        "https://niagaraopendata.ca/pages/open-government-license-2-0-town-of-lincoln",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence — The Corporation of the Town of Lincoln (https://niagaraopendata.ca/pages/open-government-license-2-0-town-of-lincoln)."#,
    ),
    (
        "https://open.alberta.ca/licence",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – Alberta (https://open.alberta.ca/licence)."#,
    ),
    (
        "https://www.arcgis.com/sharing/rest/content/items/2ffb1ce148804fe4ade2414e6ef10d21/data",
        r#"I. Terms of Use. Contains information licensed under the Open Government Licence – The Corporation of the Municipality of Chatham-Kent (https://www.arcgis.com/sharing/rest/content/items/2ffb1ce148804fe4ade2414e6ef10d21/data)."#,
    ),
    (
        "http://data.open.guelph.ca/pages/open-government-licence",
        r#"I. Terms of Use. Contains information provided by the City of Guelph under an open government license (http://data.open.guelph.ca/pages/open-government-licence)."#,
    ),
    (
        "http://donnees.ville.montreal.qc.ca/portail/licence/",
        r#"I. Termes d'utilisation. Contient des données reproduites, modifiées, traduites ou distribuées « telles quelles » avec la permission de la Ville de Montréal (http://donnees.ville.montreal.qc.ca/portail/licence/)."#,
    ),
    (
        "http://donnees.ville.sherbrooke.qc.ca/licence.html",
        r#"I. Termes d'utilisation. Contient des données reproduites et distribuées « telles quelles » avec la permission de la Ville de Sherbrooke (http://donnees.ville.sherbrooke.qc.ca/licence.html)."#,
    ),
    (
        "http://opendata.peelregion.ca/terms-of-use.aspx",
        r#"I. Terms of Use. Contains public sector Information made available under The Regional Municipality of Peel's Open Data Licence - Version 1.0 (http://opendata.peelregion.ca/terms-of-use.aspx)."#,
    ),
    (
        "http://www.electionspei.ca/apilicense",
        r#"I. Terms of Use. This information is provided by Elections PEI under the Elections PEI Data License (http://www.electionspei.ca/apilicense)."#,
    ),
    (
        "http://www.greatersudbury.ca/inside-city-hall/open-government/open-data/licence/",
        r#"I. Terms of Use. Contains information licensed under the Open Data Licence – City of Greater Sudbury (http://www.greatersudbury.ca/inside-city-hall/open-government/open-data/licence/)."#,
    ),
    (
        "https://www.hamilton.ca/city-initiatives/strategies-actions/open-accessible-data",
        r#"I. Terms of Use. Contains public sector Data made available under the City of Hamilton’s Open Data Licence (https://www.hamilton.ca/city-initiatives/strategies-actions/open-accessible-data)."#,
    ),
    (
        "http://www.milton.ca/en/resourcesGeneral/Open_Data/Milton_Open_Data_Terms_V1.pdf",
        r#"I. Terms of Use. Contains public sector Datasets made available under the Town of Milton's Open Data License v.1 (http://www.milton.ca/en/resourcesGeneral/Open_Data/Milton_Open_Data_Terms_V1.pdf)."#,
    ),
    (
        "http://www.regionofwaterloo.ca/en/regionalGovernment/OpenDataLicence.asp",
        r#"I. Terms of Use. Contains information provided by the Regional Municipality of Waterloo under licence (http://www.regionofwaterloo.ca/en/regionalGovernment/OpenDataLicence.asp)."#,
    ),
    (
        "http://mli2.gov.mb.ca/app/register/app/index.php",
        r#"© 2001 Her Majesty the Queen in Right of Manitoba, as represented by the Minister of Conservation. All rights reserved. Distributed under the terms of the Manitoba Land Initiative Terms and Conditions of Use (http://mli2.gov.mb.ca//app/register/app/index.php)."#,
    ),
];

/// Look up the terms for a licence URL.
pub fn terms_for(licence_url: &str) -> Option<LicenceTerms> {
    if let Some((_, text)) = EXACT_TERMS.iter().find(|(url, _)| *url == licence_url) {
        return Some(LicenceTerms::Exact(*text));
    }
    if let Some((_, re)) = PATTERN_TERMS.iter().find(|(url, _)| *url == licence_url) {
        return Some(LicenceTerms::Pattern(re));
    }
    if ALL_RIGHTS_RESERVED_LICENCES.contains(&licence_url) {
        return Some(LicenceTerms::Pattern(&ALL_RIGHTS_RESERVED_TERMS));
    }
    None
}

/// True when the licence needs a recorded template but none exists.
pub fn is_missing_template(licence_url: &str) -> bool {
    LICENCES_WITH_TEMPLATES.contains(&licence_url) && terms_for(licence_url).is_none()
}

/// Compare licence text (trailing whitespace ignored) with the recorded terms.
pub fn check_licence(licence_url: &str, text: &str) -> LicenceCheck {
    let text = text.trim_end();
    match terms_for(licence_url) {
        None => LicenceCheck::Unknown,
        Some(LicenceTerms::Exact(expected)) if expected == text => LicenceCheck::Matches,
        Some(LicenceTerms::Pattern(re)) if re.is_match(text) => LicenceCheck::Matches,
        Some(_) => LicenceCheck::Mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATERLOO: &str = "http://www.regionofwaterloo.ca/en/regionalGovernment/OpenDataLicence.asp";

    #[test]
    fn exact_template_matches_with_trailing_newline() {
        let text = "I. Terms of Use. Contains information provided by the Regional Municipality of Waterloo under licence (http://www.regionofwaterloo.ca/en/regionalGovernment/OpenDataLicence.asp).\n";
        assert_eq!(check_licence(WATERLOO, text), LicenceCheck::Matches);
    }

    #[test]
    fn altered_text_is_rejected() {
        let text = "I. Terms of Use. Contains information provided by Waterloo.";
        assert_eq!(check_licence(WATERLOO, text), LicenceCheck::Mismatch);
    }

    #[test]
    fn pattern_template() {
        let url = "http://donnees.ville.quebec.qc.ca/licence.aspx";
        let text = "I. Terms of Use. This material is licensed under a Creative Commons Attribution 4.0 International License. To view a copy of this license, visit http://creativecommons.org/licenses/by/4.0/legalcode. It is attributed to Ville de Québec, and the original version can be found at http://donnees.ville.quebec.qc.ca/.";
        assert_eq!(check_licence(url, text), LicenceCheck::Matches);
        assert_eq!(check_licence(url, "I. Terms of Use."), LicenceCheck::Mismatch);
    }

    #[test]
    fn all_rights_reserved_template() {
        let url = ALL_RIGHTS_RESERVED_LICENCES[0];
        let text = "Distributed with permission from the City of Saskatoon.  Please direct licensing inquiries and requests to:\n\nCity Clerk's Office\n222 3rd Avenue North\n";
        assert_eq!(check_licence(url, text), LicenceCheck::Matches);
        assert_eq!(
            check_licence(url, "Distributed with permission."),
            LicenceCheck::Mismatch
        );
    }

    #[test]
    fn unknown_licence() {
        assert_eq!(
            check_licence("http://example.com/licence", "anything"),
            LicenceCheck::Unknown
        );
        assert!(!is_missing_template("http://example.com/licence"));
    }

    #[test]
    fn every_templated_licence_has_terms() {
        for url in LICENCES_WITH_TEMPLATES {
            assert!(!is_missing_template(url), "{url}");
        }
    }
}
