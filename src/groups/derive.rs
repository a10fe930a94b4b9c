use crate::profile::{Company, Profile, School};

use super::{GroupInfo, GroupSource};

/// Every group a profile qualifies for, schools first, in input order.
/// Duplicates are kept; `reconcile_groups` drops them.
pub fn derive_groups(profile: &Profile) -> Vec<GroupInfo> {
    let mut groups = Vec::new();
    for school in &profile.schools {
        school_groups(school, &mut groups);
    }
    for company in &profile.companies {
        company_groups(company, &mut groups);
    }
    groups
}

fn school_groups(school: &School, groups: &mut Vec<GroupInfo>) {
    let name = strip(&school.name);
    if name.is_empty() {
        return;
    }
    groups.push(GroupInfo::new(name.clone(), GroupSource::School));

    let degree = strip(&school.degree);
    if !degree.is_empty() {
        let field = strip(&school.field_of_study);
        groups.push(GroupInfo::new(
            format!("{name}-{degree}-{field}-{}-{}", school.from_year, school.to_year),
            GroupSource::School,
        ));
    }
}

fn company_groups(company: &Company, groups: &mut Vec<GroupInfo>) {
    let name = strip(&company.name);
    if name.is_empty() {
        return;
    }
    groups.push(GroupInfo::new(name.clone(), GroupSource::Company));

    let location = strip(&company.location);
    if !location.is_empty() {
        groups.push(GroupInfo::new(format!("{name}-{location}"), GroupSource::Company));
    }
}

fn strip(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::groups::Group;

    fn names(groups: &[GroupInfo]) -> Vec<&str> {
        groups.iter().map(|g| g.group.as_str()).collect()
    }

    #[test]
    fn school_with_degree_gets_coarse_and_fine_group() {
        let profile = Profile {
            schools: vec![School {
                name: "Colorado State University".into(),
                degree: "Masters".into(),
                field_of_study: "Computer Science".into(),
                from_year: 2015,
                to_year: 2017,
            }],
            ..Default::default()
        };

        let groups = derive_groups(&profile);
        assert_eq!(
            names(&groups),
            vec![
                "ColoradoStateUniversity",
                "ColoradoStateUniversity-Masters-ComputerScience-2015-2017"
            ]
        );
        assert!(groups.iter().all(|g| g.source == GroupSource::School));
    }

    #[test]
    fn school_without_degree_gets_one_group() {
        let profile = Profile {
            schools: vec![School { name: "MIT".into(), ..Default::default() }],
            ..Default::default()
        };
        assert_eq!(derive_groups(&profile), vec![GroupInfo::new("MIT", GroupSource::School)]);
    }

    #[test]
    fn company_with_location() {
        let profile = Profile {
            companies: vec![Company {
                name: "Hungry Hour".into(),
                location: "Sunnyvale".into(),
                title: "Engineer".into(),
                from_year: 2018,
                to_year: 2019,
            }],
            ..Default::default()
        };

        let groups = derive_groups(&profile);
        assert_eq!(names(&groups), vec!["HungryHour", "HungryHour-Sunnyvale"]);
        assert!(groups.iter().all(|g| g.source == GroupSource::Company));
    }

    #[test]
    fn blank_names_are_skipped() {
        let profile = Profile {
            schools: vec![School {
                name: "  ".into(),
                degree: "BS".into(),
                ..Default::default()
            }],
            companies: vec![Company {
                name: "".into(),
                location: "Austin".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(derive_groups(&profile).is_empty());
    }

    #[test]
    fn schools_come_before_companies_and_duplicates_survive() {
        let profile = Profile {
            schools: vec![
                School { name: "MIT".into(), ..Default::default() },
                School { name: "M I T".into(), ..Default::default() },
            ],
            companies: vec![Company { name: "Acme".into(), ..Default::default() }],
            ..Default::default()
        };

        let first = derive_groups(&profile);
        assert_eq!(names(&first), vec!["MIT", "MIT", "Acme"]);
        assert_eq!(first, derive_groups(&profile));
        assert_eq!(first[2].group, Group::new("Acme"));
    }
}
