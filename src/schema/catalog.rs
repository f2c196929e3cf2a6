//! Schema catalog for the ECEG 2020 census tables.
//!
//! Pure data. The field enumerations mirror the upstream census export
//! layout: two small geographic catalogs with Spanish-analyzed description
//! fields, and three statistics tables that share one demographic/housing
//! block behind different key prefixes.

use super::{Field, TableSpec, float, integer, keyword, spanish_text, text};

pub struct CatalogEntry {
    pub spec: TableSpec,
    /// Source CSV file name, resolved against the configured data directory.
    pub file_name: &'static str,
}

/// All configured tables, in load order.
pub fn entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            spec: cat_distrito(),
            file_name: "cat_distritos_2020.csv",
        },
        CatalogEntry {
            spec: cat_seccion(),
            file_name: "cat_secciones_2020.csv",
        },
        CatalogEntry {
            spec: ine_distrito(),
            file_name: "INE_DISTRITO_2020.CSV",
        },
        CatalogEntry {
            spec: ine_entidad(),
            file_name: "INE_ENTIDAD_2020.CSV",
        },
        CatalogEntry {
            spec: ine_seccion(),
            file_name: "INE_SECCION_2020.csv",
        },
    ]
}

fn cat_distrito() -> TableSpec {
    TableSpec {
        index: "cat_distrito_2020".to_string(),
        fields: vec![
            keyword("CVE_ENT"),
            spanish_text("DESC_ENT"),
            keyword("CVE_DISTRITO"),
            spanish_text("DESC_DISTRITO"),
        ],
        id_field: Some("CVE_DISTRITO".to_string()),
    }
}

fn cat_seccion() -> TableSpec {
    TableSpec {
        index: "cat_seccion_2020".to_string(),
        fields: vec![
            keyword("CVE_ENT"),
            keyword("CVE_DISTRITO"),
            keyword("CVE_MUN"),
            spanish_text("DESC_MUN"),
            keyword("CVE_SECCION"),
            spanish_text("DESC_SECCION"),
        ],
        id_field: Some("CVE_SECCION".to_string()),
    }
}

fn ine_distrito() -> TableSpec {
    let mut fields = vec![
        keyword("ENTIDAD"),
        text("NOM_ENT"),
        keyword("DISTRITO"),
        keyword("INDIGENA"),
        keyword("COMPLEJIDA"),
    ];
    fields.extend(census_block());
    TableSpec {
        index: "ine_distrito_2020".to_string(),
        fields,
        id_field: Some("DISTRITO".to_string()),
    }
}

fn ine_entidad() -> TableSpec {
    let mut fields = vec![keyword("ENT"), text("NOM_ENT")];
    fields.extend(census_block());
    TableSpec {
        index: "ine_entidad_2020".to_string(),
        fields,
        id_field: Some("ENT".to_string()),
    }
}

fn ine_seccion() -> TableSpec {
    let mut fields = vec![
        integer("ID"),
        integer("ENTIDAD"),
        integer("DISTRITO"),
        integer("MUNICIPIO"),
        integer("SECCION"),
        integer("TIPO"),
    ];
    fields.extend(census_block());
    TableSpec {
        index: "ine_seccion_2020".to_string(),
        fields,
        id_field: Some("ID".to_string()),
    }
}

/// Demographic and housing fields shared by the three INE tables.
fn census_block() -> Vec<Field> {
    CENSUS_FIELDS
        .iter()
        .map(|&name| {
            if CENSUS_FLOAT_FIELDS.contains(&name) {
                float(name)
            } else {
                integer(name)
            }
        })
        .collect()
}

/// Derived averages and ratios; everything else in the block is a count.
const CENSUS_FLOAT_FIELDS: &[&str] = &[
    "REL_H_M",
    "PROM_HNV",
    "GRAPROES",
    "GRAPROES_F",
    "GRAPROES_M",
    "PROM_OCUP",
    "PRO_OCUP_C",
];

const CENSUS_FIELDS: &[&str] = &[
    // Total population
    "POBTOT",
    "POBFEM",
    "POBMAS",
    // Age brackets
    "P_0A2",
    "P_0A2_F",
    "P_0A2_M",
    "P_0A17",
    "P_3YMAS",
    "P_3YMAS_F",
    "P_3YMAS_M",
    "P_5YMAS",
    "P_5YMAS_F",
    "P_5YMAS_M",
    "P_12YMAS",
    "P_12YMAS_F",
    "P_12YMAS_M",
    "P_15YMAS",
    "P_15YMAS_F",
    "P_15YMAS_M",
    "P_18YMAS",
    "P_18YMAS_F",
    "P_18YMAS_M",
    "P_3A5",
    "P_3A5_F",
    "P_3A5_M",
    "P_6A11",
    "P_6A11_F",
    "P_6A11_M",
    "P_8A14",
    "P_8A14_F",
    "P_8A14_M",
    "P_12A14",
    "P_12A14_F",
    "P_12A14_M",
    "P_15A17",
    "P_15A17_F",
    "P_15A17_M",
    "P_18A24",
    "P_18A24_F",
    "P_18A24_M",
    "P_15A49_F",
    "P_60YMAS",
    "P_60YMAS_F",
    "P_60YMAS_M",
    // Structure indicators
    "REL_H_M",
    "POB0_14",
    "POB15_64",
    "POB65_MAS",
    "POB_EDADNE",
    "PROM_HNV",
    // Birthplace and residence in 2015
    "PNACENT",
    "PNACENT_F",
    "PNACENT_M",
    "PNACOE",
    "PNACOE_F",
    "PNACOE_M",
    "PRES2015",
    "PRES2015_F",
    "PRES2015_M",
    "PRESOE15",
    "PRESOE15_F",
    "PRESOE15_M",
    // Indigenous and Afro-Mexican population
    "P3YM_HLI",
    "P3YM_HLI_F",
    "P3YM_HLI_M",
    "P3HLINHE",
    "P3HLINHE_F",
    "P3HLINHE_M",
    "P3HLI_HE",
    "P3HLI_HE_F",
    "P3HLI_HE_M",
    "P5_HLI",
    "P5_HLI_NHE",
    "P5_HLI_HE",
    "PHOG_IND",
    "POB_AFRO",
    "POB_AFRO_F",
    "POB_AFRO_M",
    // Disability
    "PCON_DISC",
    "PCDISC_MOT",
    "PCDISC_VIS",
    "PCDISC_LEN",
    "PCDISC_AUD",
    "PCDISC_M_A",
    "PCDISC_MEN",
    "PCON_LIMI",
    "PCLIM_CSB",
    "PCLIM_VIS",
    "PCLIM_HACO",
    "PCLIM_OAUD",
    "PCLIM_MOT2",
    "PCLIM_RE_C",
    "PCLIM_PMEN",
    "PSIND_LIM",
    // Education
    "P3A5_NOA",
    "P3A5_NOA_F",
    "P3A5_NOA_M",
    "P6A11_NOA",
    "P6A11_NOAF",
    "P6A11_NOAM",
    "P12A14NOA",
    "P12A14NOAF",
    "P12A14NOAM",
    "P15A17A",
    "P15A17A_F",
    "P15A17A_M",
    "P18A24A",
    "P18A24A_F",
    "P18A24A_M",
    "P8A14AN",
    "P8A14AN_F",
    "P8A14AN_M",
    "P15YM_AN",
    "P15YM_AN_F",
    "P15YM_AN_M",
    "P15YM_SE",
    "P15YM_SE_F",
    "P15YM_SE_M",
    "P15PRI_IN",
    "P15PRI_INF",
    "P15PRI_INM",
    "P15PRI_CO",
    "P15PRI_COF",
    "P15PRI_COM",
    "P15SEC_IN",
    "P15SEC_INF",
    "P15SEC_INM",
    "P15SEC_CO",
    "P15SEC_COF",
    "P15SEC_COM",
    "P18YM_PB",
    "P18YM_PB_F",
    "P18YM_PB_M",
    "GRAPROES",
    "GRAPROES_F",
    "GRAPROES_M",
    // Economic activity
    "PEA",
    "PEA_F",
    "PEA_M",
    "PE_INAC",
    "PE_INAC_F",
    "PE_INAC_M",
    "POCUPADA",
    "POCUPADA_F",
    "POCUPADA_M",
    "PDESOCUP",
    "PDESOCUP_F",
    "PDESOCUP_M",
    // Health coverage
    "PSINDER",
    "PDER_SS",
    "PDER_IMSS",
    "PDER_ISTE",
    "PDER_ISTEE",
    "PAFIL_PDOM",
    "PDER_SEGP",
    "PDER_IMSSB",
    "PAFIL_IPRI",
    "PAFIL_OTRA",
    // Marital status
    "P12YM_CASA",
    "P12YM_SEPA",
    // Households
    "TOTHOG",
    "HOGJEF_F",
    "HOGJEF_M",
    "POBHOG",
    "PHOGJEF_F",
    "PHOGJEF_M",
    // Dwellings
    "VIVTOT",
    "TVIVHAB",
    "TVIVPAR",
    "VIVPAR_HAB",
    "VIVPARH_CV",
    "TVIVPARHAB",
    "VIVPAR_DES",
    "VIVPAR_UT",
    "OCUPVIVPAR",
    "PROM_OCUP",
    "PRO_OCUP_C",
    "VPH_PISODT",
    "VPH_PISOTI",
    "VPH_1DOR",
    "VPH_2YMASD",
    "VPH_1CUART",
    "VPH_2CUART",
    "VPH_3YMASC",
    // Dwelling services
    "VPH_C_ELEC",
    "VPH_S_ELEC",
    "VPH_AGUADV",
    "VPH_AEASP",
    "VPH_AGUAFV",
    "VPH_TINACO",
    "VPH_CISTER",
    "VPH_EXCSA",
    "VPH_LETR",
    "VPH_DRENAJ",
    "VPH_NODREN",
    "VPH_C_SERV",
    "VPH_NDEAED",
    "VPH_DSADMA",
    "VPH_NDACMM",
    // Dwelling goods and connectivity
    "VPH_SNBIEN",
    "VPH_REFRI",
    "VPH_LAVAD",
    "VPH_HMICRO",
    "VPH_AUTOM",
    "VPH_MOTO",
    "VPH_BICI",
    "VPH_RADIO",
    "VPH_TV",
    "VPH_PC",
    "VPH_TELEF",
    "VPH_CEL",
    "VPH_INTER",
    "VPH_STVP",
    "VPH_SPMVPI",
    "VPH_CVJ",
    "VPH_SINRTV",
    "VPH_SINLTC",
    "VPH_SINCIN",
    "VPH_SINTIC",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn all_entries_validate() {
        let entries = entries();
        assert_eq!(entries.len(), 5);
        for entry in &entries {
            entry.spec.validate().unwrap();
        }
    }

    #[test]
    fn census_block_types() {
        let block = census_block();
        assert_eq!(block.len(), CENSUS_FIELDS.len());

        let rel_h_m = block.iter().find(|f| f.name == "REL_H_M").unwrap();
        assert_eq!(rel_h_m.field_type, FieldType::Float);

        let pobtot = block.iter().find(|f| f.name == "POBTOT").unwrap();
        assert_eq!(pobtot.field_type, FieldType::Integer);
    }

    #[test]
    fn catalog_descriptions_use_spanish_analyzer() {
        let spec = cat_distrito();
        let desc = spec.fields.iter().find(|f| f.name == "DESC_ENT").unwrap();
        assert_eq!(
            desc.field_type,
            FieldType::Text {
                analyzer: Some("spanish_analyzer".to_string())
            }
        );
    }

    #[test]
    fn no_duplicate_field_names() {
        for entry in entries() {
            let mut seen = std::collections::HashSet::new();
            for field in &entry.spec.fields {
                assert!(
                    seen.insert(field.name.as_str()),
                    "duplicate field {} in {}",
                    field.name,
                    entry.spec.index
                );
            }
        }
    }
}
