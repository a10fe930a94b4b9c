use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    config::CrawlSettings,
    error::{Error, Result},
    profile::{Company, Profile, School},
};

use super::CrawlProvider;

const PROVIDER: &str = "phantombuster";
const API_KEY_HEADER: &str = "X-Phantombuster-Key-1";
const OUTPUT: &str = "result-object-with-output";
const RANGE_SEPARATOR: &str = " – ";
const PRESENT: &str = "Present";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Argument<'a> {
    session_cookie: &'a str,
    profile_urls: [&'a str; 1],
    no_database: bool,
}

#[derive(Serialize)]
struct LaunchRequest<'a> {
    output: &'a str,
    argument: Argument<'a>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LaunchResponse {
    status: String,
    message: String,
    data: LaunchData,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct LaunchData {
    result_object: Vec<ResultObject>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ResultObject {
    general: General,
    jobs: Vec<Job>,
    schools: Vec<SchoolEntry>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct General {
    first_name: String,
    last_name: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Job {
    company_name: String,
    job_title: String,
    date_range: String,
    location: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SchoolEntry {
    school_name: String,
    degree: String,
    degree_spec: String,
    date_range: String,
}

/// Launches a Phantombuster LinkedIn profile scraper agent and waits for its
/// result object.
pub struct PhantomClient {
    http: reqwest::Client,
    base_url: String,
    agent_id: String,
    api_key: String,
    session_cookie: String,
}

impl PhantomClient {
    pub fn new(settings: &CrawlSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.phantom_url.trim_end_matches('/').to_owned(),
            agent_id: settings.agent_id.clone(),
            api_key: settings.api_key.clone(),
            session_cookie: settings.session_cookie.clone(),
        }
    }

    fn launch_url(&self) -> String {
        format!("{}/api/v1/agent/{}/launch", self.base_url, self.agent_id)
    }
}

fn provider_err(e: impl std::fmt::Display) -> Error {
    Error::provider(PROVIDER, e)
}

#[async_trait]
impl CrawlProvider for PhantomClient {
    async fn get_user_profile(&self, linkedin_url: &str) -> Result<Profile> {
        let url = self.launch_url();
        let request = LaunchRequest {
            output: OUTPUT,
            argument: Argument {
                session_cookie: &self.session_cookie,
                profile_urls: [linkedin_url],
                no_database: true,
            },
        };

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(provider_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, %status, body = %body, "crawl launch failed");
            return Err(provider_err(format!("launch returned {status}")));
        }

        let launch: LaunchResponse = response.json().await.map_err(provider_err)?;
        if launch.status == "error" {
            return Err(provider_err(launch.message));
        }

        let profile = to_profile(launch.data, current_year())?;
        info!(
            linkedin_url,
            schools = profile.schools.len(),
            companies = profile.companies.len(),
            "crawled profile"
        );
        Ok(profile)
    }
}

fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

fn to_profile(data: LaunchData, current_year: i32) -> Result<Profile> {
    let Some(general) = data.result_object.last().map(|obj| &obj.general) else {
        return Err(provider_err("crawl returned no profile"));
    };

    let mut profile = Profile {
        first_name: general.first_name.trim().to_owned(),
        last_name: general.last_name.trim().to_owned(),
        ..Default::default()
    };

    for obj in &data.result_object {
        for school in &obj.schools {
            let (from_year, to_year) = parse_date_range(&school.date_range, current_year)?;
            profile.schools.push(School {
                name: strip_special(&school.school_name),
                degree: strip_special(&school.degree),
                field_of_study: strip_special(&school.degree_spec),
                from_year,
                to_year,
            });
        }
        for job in &obj.jobs {
            let (from_year, to_year) = parse_date_range(&job.date_range, current_year)?;
            profile.companies.push(Company {
                name: strip_special(&job.company_name),
                location: strip_special(&job.location),
                title: strip_special(&job.job_title),
                from_year,
                to_year,
            });
        }
    }

    Ok(profile)
}

fn strip_special(s: &str) -> String {
    s.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// `"2015 – 2017"`, `"Jan 2015 – Present"` or a lone `"2015"`.
fn parse_date_range(range: &str, current_year: i32) -> Result<(i32, i32)> {
    let parts: Vec<&str> = range.split(RANGE_SEPARATOR).map(str::trim).collect();
    match parts.as_slice() {
        [single] => {
            let year = parse_year(single, current_year)
                .ok_or_else(|| provider_err(format!("invalid date range {range:?}")))?;
            Ok((year, year))
        }
        [from, to] => match (parse_year(from, current_year), parse_year(to, current_year)) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(provider_err(format!("invalid date range {range:?}"))),
        },
        _ => Err(provider_err(format!("invalid date range {range:?}"))),
    }
}

fn parse_year(part: &str, current_year: i32) -> Option<i32> {
    if part == PRESENT {
        return Some(current_year);
    }
    part.split_whitespace().last()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const RESPONSE: &str = r#"{
        "status": "success",
        "message": "Agent finished",
        "data": {
            "containerId": 1,
            "resultObject": [{
                "general": {
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "fullName": "Ada Lovelace"
                },
                "jobs": [
                    {
                        "companyName": "Hungry Hour",
                        "jobTitle": "Software Engineer",
                        "dateRange": "Jan 2017 – Present",
                        "location": "Sunnyvale, CA"
                    },
                    {
                        "companyName": "Initech",
                        "jobTitle": "Intern",
                        "dateRange": "Jun 2016 – Aug 2016",
                        "location": ""
                    }
                ],
                "schools": [
                    {
                        "schoolName": "Colorado State University",
                        "degree": "Master's",
                        "degreeSpec": "Computer Science",
                        "dateRange": "2015 – 2017"
                    }
                ]
            }]
        }
    }"#;

    #[test]
    fn parses_launch_response_into_profile() {
        let launch: LaunchResponse = serde_json::from_str(RESPONSE).unwrap();
        let profile = to_profile(launch.data, 2026).unwrap();

        assert_eq!(profile.first_name, "Ada");
        assert_eq!(
            profile.schools,
            vec![School {
                name: "ColoradoStateUniversity".into(),
                degree: "Masters".into(),
                field_of_study: "ComputerScience".into(),
                from_year: 2015,
                to_year: 2017,
            }]
        );
        assert_eq!(profile.companies[0].name, "HungryHour");
        assert_eq!(profile.companies[0].location, "SunnyvaleCA");
        assert_eq!((profile.companies[0].from_year, profile.companies[0].to_year), (2017, 2026));
        assert_eq!((profile.companies[1].from_year, profile.companies[1].to_year), (2016, 2016));
    }

    #[test]
    fn date_ranges() {
        assert_eq!(parse_date_range("2015 – 2017", 2026).unwrap(), (2015, 2017));
        assert_eq!(parse_date_range("Mar 2019 – Present", 2026).unwrap(), (2019, 2026));
        assert_eq!(parse_date_range("2012", 2026).unwrap(), (2012, 2012));
    }

    #[test]
    fn malformed_date_ranges_are_provider_errors() {
        for range in ["", "soon", "2015 – later", "2015 – 2016 – 2017"] {
            let err = parse_date_range(range, 2026).unwrap_err();
            assert!(matches!(err, Error::Provider { provider: PROVIDER, .. }), "{range}");
        }
    }

    #[test]
    fn empty_result_is_an_error() {
        assert!(to_profile(LaunchData::default(), 2026).is_err());
    }

    #[test]
    fn launch_request_shape() {
        let request = LaunchRequest {
            output: OUTPUT,
            argument: Argument {
                session_cookie: "cookie",
                profile_urls: ["https://www.linkedin.com/in/ada"],
                no_database: true,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["argument"]["profileUrls"][0], "https://www.linkedin.com/in/ada");
        assert_eq!(json["argument"]["noDatabase"], true);
        assert_eq!(json["output"], OUTPUT);
    }
}
