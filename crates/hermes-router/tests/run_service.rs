//! Integration tests for declaration parsing and argument binding.
//!
//! `RunService` exercises every parameter source the engine supports:
//! query, header, cookie, context, request parameter and body in all three
//! built-in media types.

use hermes_convert::{ConverterRegistry, ResponseSink};
use hermes_core::media::{APPLICATION_JSON, APPLICATION_OCTET_STREAM};
use hermes_core::{Args, BoxError, InboundRequest, RequestContext, Verb};
use hermes_router::{parse, Constructors, Param, ParamBinding, Resource, ResourceDef, RouteTable};
use http::{Method, Uri};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MapEntry {
    city: String,
    route: Vec<String>,
}

#[derive(Default)]
struct RunService;

impl RunService {
    fn workouts(&self, mut args: Args) -> Result<Vec<Value>, BoxError> {
        let day: Option<i32> = args.take(0)?;
        let month: Option<i32> = args.take(1)?;
        let year: Option<i64> = args.take(2)?;
        Ok(vec![json!(day), json!(month), json!(year)])
    }

    fn pace(&self, mut args: Args) -> Result<Vec<Value>, BoxError> {
        let pace: Option<i32> = args.take(0)?;
        let time: Option<String> = args.take(1)?;
        Ok(vec![json!(pace), json!(time)])
    }

    fn map(&self, mut args: Args) -> Result<Option<MapEntry>, BoxError> {
        Ok(args.take(0)?)
    }

    fn binary(&self, mut args: Args) -> Result<Vec<u8>, BoxError> {
        Ok(args.take::<Vec<u8>>(0)?.unwrap_or_default())
    }

    fn session(&self, mut args: Args) -> Result<String, BoxError> {
        let context: RequestContext = args.required(0)?;
        let unit: Option<String> = args.take(1)?;
        Ok(format!(
            "{} {}",
            context.route_path(),
            unit.unwrap_or_else(|| "none".to_string())
        ))
    }

    fn distance(&self, mut args: Args) -> Result<f64, BoxError> {
        Ok(args.take(0)?.unwrap_or(0.0))
    }

    fn unrouted(&self, _args: Args) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Resource for RunService {
    fn describe(def: &mut ResourceDef<Self>) {
        def.path("/run").produces(APPLICATION_JSON);
        def.method("workouts", Self::workouts)
            .get()
            .path("/workouts")
            .param(Param::of::<i32>("day").query("day"))
            .param(Param::of::<i32>("month").query("month"))
            .param(Param::of::<i64>("year").header("year"));
        def.method("pace", Self::pace)
            .post()
            .path("/pace")
            .consumes("text/plain")
            .param(Param::of::<i32>("pace").query("pace"))
            .param(Param::of::<String>("time"));
        def.method("map", Self::map)
            .post()
            .path("/map")
            .consumes(APPLICATION_JSON)
            .param(Param::of::<MapEntry>("entry"));
        def.method("binary", Self::binary)
            .post()
            .path("/binary")
            .consumes(APPLICATION_OCTET_STREAM)
            .produces(APPLICATION_OCTET_STREAM)
            .param(Param::of::<Vec<u8>>("data"));
        def.method("session", Self::session)
            .get()
            .produces("text/plain")
            .param(Param::context("context"))
            .param(Param::of::<String>("unit").cookie("unit"));
        def.method("distance", Self::distance)
            .get()
            .path("/distance")
            .param(Param::of::<f64>("km").default_value("5.5"));
        def.method("unrouted", Self::unrouted);
    }
}

fn table() -> RouteTable {
    let factory = Constructors::new().with_default::<RunService>();
    let mut table = RouteTable::new(Arc::new(ConverterRegistry::new()), Arc::new(factory));
    table.add_handler_type::<RunService>().unwrap();
    table
}

async fn call(table: &RouteTable, verb: Verb, request: InboundRequest) -> ResponseSink {
    let route = Arc::clone(table.lookup(verb, request.path()).expect("route"));
    let request = Arc::new(request);
    let context = RequestContext::new(Arc::clone(&request), route.path());
    let args = route.bind(&request, &context).unwrap();
    let instance = table.instance_for(route.handler_type()).unwrap();
    let reply = route.invoke(instance, args).await.unwrap();

    let mut sink = ResponseSink::new();
    sink.set_content_type(route.response_content_type()).unwrap();
    route.write(reply, &mut sink).unwrap();
    sink
}

fn body_json(sink: &ResponseSink) -> Value {
    serde_json::from_slice(sink.body()).unwrap()
}

#[test]
fn test_parse_skips_methods_without_verb() {
    let routes = parse::<RunService>(&ConverterRegistry::new()).unwrap();
    let names: Vec<_> = routes.iter().map(|r| r.method_name()).collect();
    assert_eq!(names, ["workouts", "pace", "map", "binary", "session", "distance"]);
}

#[test]
fn test_parse_bindings() {
    let routes = parse::<RunService>(&ConverterRegistry::new()).unwrap();
    let workouts = &routes[0];
    let bindings: Vec<_> = workouts.params().iter().map(|p| p.binding().clone()).collect();
    assert_eq!(
        bindings,
        [
            ParamBinding::Query {
                key: "day".to_string(),
                default: None
            },
            ParamBinding::Query {
                key: "month".to_string(),
                default: None
            },
            ParamBinding::Header {
                key: "year".to_string(),
                default: None
            },
        ]
    );

    let pace = &routes[1];
    assert_eq!(
        pace.params()[1].binding(),
        &ParamBinding::Body {
            content_type: "text/plain".to_string()
        }
    );

    let session = &routes[4];
    assert_eq!(session.path(), "/run/session");
    assert_eq!(session.params()[0].binding(), &ParamBinding::Context);
}

#[tokio::test]
async fn test_query_and_header_parameters() {
    let table = table();
    let request = InboundRequest::builder()
        .uri(Uri::from_static("/run/workouts?day=10&month=1"))
        .header("year", "2017")
        .build();

    let sink = call(&table, Verb::Get, request).await;
    assert_eq!(body_json(&sink), json!([10, 1, 2017]));
}

#[tokio::test]
async fn test_missing_parameters_bind_as_absent() {
    let table = table();
    let request = InboundRequest::builder()
        .uri(Uri::from_static("/run/workouts?day=10"))
        .build();

    let sink = call(&table, Verb::Get, request).await;
    assert_eq!(body_json(&sink), json!([10, null, null]));
}

#[tokio::test]
async fn test_query_and_text_body() {
    let table = table();
    let request = InboundRequest::builder()
        .method(Method::POST)
        .uri(Uri::from_static("/run/pace?pace=10"))
        .header("content-type", "text/plain")
        .body("test")
        .build();

    let sink = call(&table, Verb::Post, request).await;
    assert_eq!(body_json(&sink), json!([10, "test"]));
}

#[tokio::test]
async fn test_json_body() {
    let table = table();
    let request = InboundRequest::builder()
        .method(Method::POST)
        .uri(Uri::from_static("/run/map"))
        .body(r#"{"city":"Kiev", "route": ["1", "2", "3"]}"#)
        .build();

    let sink = call(&table, Verb::Post, request).await;
    assert_eq!(
        body_json(&sink),
        json!({"city": "Kiev", "route": ["1", "2", "3"]})
    );
}

#[tokio::test]
async fn test_binary_body() {
    let table = table();
    let request = InboundRequest::builder()
        .method(Method::POST)
        .uri(Uri::from_static("/run/binary"))
        .body(vec![1_u8, 2, 3])
        .build();

    let sink = call(&table, Verb::Post, request).await;
    assert_eq!(sink.body(), [1, 2, 3]);
}

#[tokio::test]
async fn test_context_and_cookie() {
    let table = table();
    let request = InboundRequest::builder()
        .uri(Uri::from_static("/run/session"))
        .header("cookie", "theme=dark; unit=km")
        .build();

    let sink = call(&table, Verb::Get, request).await;
    assert_eq!(sink.body(), b"/run/session km");
}

#[tokio::test]
async fn test_request_parameter_default() {
    let table = table();
    let request = InboundRequest::builder()
        .uri(Uri::from_static("/run/distance"))
        .build();
    let sink = call(&table, Verb::Get, request).await;
    assert_eq!(body_json(&sink), json!(5.5));

    let request = InboundRequest::builder()
        .uri(Uri::from_static("/run/distance?km=42.2"))
        .build();
    let sink = call(&table, Verb::Get, request).await;
    assert_eq!(body_json(&sink), json!(42.2));
}

#[test]
fn test_unconvertible_value_fails_binding() {
    let table = table();
    let route = table.lookup(Verb::Get, "/run/workouts").unwrap();
    let request = Arc::new(
        InboundRequest::builder()
            .uri(Uri::from_static("/run/workouts?day=ten"))
            .build(),
    );
    let context = RequestContext::new(Arc::clone(&request), route.path());
    assert!(route.bind(&request, &context).is_err());
}

#[test]
fn test_custom_incoming_converter() {
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Km(f64);

    #[derive(Default)]
    struct Track;

    impl Resource for Track {
        fn describe(def: &mut ResourceDef<Self>) {
            def.method("len", |_: &Self, mut args: Args| {
                Ok::<_, BoxError>(args.take::<Km>(0)?.map(|km| km.0))
            })
            .get()
            .param(Param::of::<Km>("len").query("len"));
        }
    }

    assert!(parse::<Track>(&ConverterRegistry::new()).is_err());

    let mut registry = ConverterRegistry::new();
    registry.register_incoming(|raw: &str| raw.trim_end_matches("km").parse::<f64>().map(Km));
    let routes = parse::<Track>(&registry).unwrap();

    let request = Arc::new(
        InboundRequest::builder()
            .uri(Uri::from_static("/len?len=21km"))
            .build(),
    );
    let context = RequestContext::new(Arc::clone(&request), "/len");
    let args = routes[0].bind(&request, &context).unwrap();
    assert_eq!(args.get::<Km>(0), Some(&Km(21.0)));
}

proptest! {
    #[test]
    fn prop_query_default_applies_only_when_absent(day in any::<i32>(), present in any::<bool>()) {
        #[derive(Default)]
        struct Calendar;

        impl Resource for Calendar {
            fn describe(def: &mut ResourceDef<Self>) {
                def.method("day", |_: &Self, mut args: Args| Ok::<_, BoxError>(args.take::<i32>(0)?))
                    .get()
                    .param(Param::of::<i32>("day").query("day").default_value("1"));
            }
        }

        let routes = parse::<Calendar>(&ConverterRegistry::new()).unwrap();
        let uri: Uri = if present {
            format!("/day?day={day}").parse().unwrap()
        } else {
            Uri::from_static("/day")
        };
        let request = Arc::new(InboundRequest::builder().uri(uri).build());
        let context = RequestContext::new(Arc::clone(&request), "/day");
        let args = routes[0].bind(&request, &context).unwrap();

        let expected = if present { day } else { 1 };
        prop_assert_eq!(args.get::<i32>(0), Some(&expected));
    }
}
