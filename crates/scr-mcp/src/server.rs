use std::io::{self, BufRead, Write};
use std::time::Instant;

use scr_core::{CountryRiskLookup, Evaluator, InputError, KpiInput};
use scr_reference::{
    CountryRiskTable, InMemoryReference, JsonReferenceFile, ReferenceSource,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::{SimulatorConfig, StartupError};
use crate::protocol::{ErrorCode, JsonRpcRequest, JsonRpcResponse, ToolsCallParams};
use crate::report::SimulationReport;
use crate::transport::{write_message, Inbound, MessageReader};

const DEFAULT_MCP_PROTOCOL_VERSION: &str = "2024-11-05";

pub struct SimulatorServer {
    evaluator: Evaluator,
    reference: Box<dyn ReferenceSource>,
    countries: CountryRiskTable,
}

#[derive(Debug, Deserialize)]
struct CountryRiskInput {
    country: String,
}

impl SimulatorServer {
    pub fn new(
        evaluator: Evaluator,
        reference: Box<dyn ReferenceSource>,
        countries: CountryRiskTable,
    ) -> Self {
        Self {
            evaluator,
            reference,
            countries,
        }
    }

    /// Loads the reference population once and keeps it immutable for the
    /// lifetime of the server.
    pub fn from_config(config: &SimulatorConfig) -> Result<Self, StartupError> {
        let evaluator = Evaluator::new(config.load_profile()?)?;
        let reference = InMemoryReference::cache(&JsonReferenceFile::new(&config.reference_data))?;
        let countries = CountryRiskTable::load(&config.country_risk)?;
        info!(
            reference = %reference.describe(),
            countries = countries.len(),
            "simulator ready"
        );
        Ok(Self::new(evaluator, Box::new(reference), countries))
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                request.id.unwrap_or(Value::Null),
                ErrorCode::InvalidRequest,
                "invalid jsonrpc version",
            ));
        }

        if request.is_notification() && request.method == "notifications/initialized" {
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => {
                let protocol_version = request
                    .params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_MCP_PROTOCOL_VERSION);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": protocol_version,
                        "serverInfo": {"name": "scr-simulatord", "version": env!("CARGO_PKG_VERSION")},
                        "capabilities": {
                            "tools": {
                                "listChanged": false
                            }
                        }
                    }),
                )
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, tools_list_result()),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::failure(id, ErrorCode::MethodNotFound, "method not found"),
        };

        Some(response)
    }

    fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ToolsCallParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::failure(id, ErrorCode::InvalidParams, format!("invalid params: {err}"));
            }
        };

        let start = Instant::now();
        let response = match parsed.name.as_str() {
            "scr_simulate" => self.exec_simulate(id, parsed.arguments),
            "scr_country_risk" => self.exec_country_risk(id, parsed.arguments),
            "scr_profile" => self.exec_profile(id),
            _ => JsonRpcResponse::failure(id, ErrorCode::MethodNotFound, "unknown tool"),
        };
        info!(
            tool = %parsed.name,
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            is_error = response.error.is_some(),
            "tool call finished"
        );
        response
    }

    fn exec_simulate(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let input: KpiInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return resp.with_id(id),
        };

        let row = match input.resolve(&self.countries) {
            Ok(row) => row,
            Err(err) => return input_error_result(id, &err),
        };

        let population = match self.reference.population() {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, "reference population unavailable");
                return JsonRpcResponse::failure(
                    id,
                    ErrorCode::EvaluationFailed,
                    format!("reference data unavailable: {err}"),
                );
            }
        };

        let evaluation = match self.evaluator.evaluate(&row, &population) {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "evaluation failed");
                return JsonRpcResponse::failure(
                    id,
                    ErrorCode::EvaluationFailed,
                    format!("evaluation failed: {err}"),
                );
            }
        };

        let report = SimulationReport::render(&evaluation, input.country.as_deref().map(str::trim));
        JsonRpcResponse::tool_output(
            id,
            report.summary(),
            json!({
                "score": evaluation.result.score,
                "tier": evaluation.result.tier,
                "percentile": evaluation.result.percentile,
                "target_strength": evaluation.target_strength().label(),
                "requirements": evaluation.requirements,
                "report": report
            }),
        )
    }

    fn exec_country_risk(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: CountryRiskInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return resp.with_id(id),
        };

        let country = args.country.trim();
        match self.countries.country_risk(country) {
            Some(risk) => JsonRpcResponse::tool_output(
                id,
                format!(
                    "{country}: fragility index {}, natural disaster risk {:.1}%",
                    risk.fragility_index, risk.natural_disaster_risk_pct
                ),
                json!({
                    "country": country,
                    "fragility_index": risk.fragility_index,
                    "natural_disaster_risk_pct": risk.natural_disaster_risk_pct
                }),
            ),
            None => input_error_result(id, &InputError::CountryNotFound(country.to_string())),
        }
    }

    fn exec_profile(&self, id: Value) -> JsonRpcResponse {
        let profile = self.evaluator.scorer().profile();
        JsonRpcResponse::tool_output(
            id,
            format!(
                "tiers: LOW <= {} < MEDIUM < {} <= HIGH",
                profile.thresholds.low, profile.thresholds.medium
            ),
            json!(profile),
        )
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        self.serve(stdin.lock(), &mut io::stdout().lock())
    }

    /// Serves requests until `reader` is exhausted. Framing problems are
    /// answered with a parse error and the loop carries on with the next message.
    pub fn serve<R: BufRead, W: Write>(&self, reader: R, writer: &mut W) -> io::Result<()> {
        let mut messages = MessageReader::new(reader);
        while let Some(inbound) = messages.next_message()? {
            let (reply, framing) = match inbound {
                Inbound::Malformed { reason, framing } => {
                    warn!(%reason, "dropping malformed stdio frame");
                    let reply = JsonRpcResponse::failure(
                        Value::Null,
                        ErrorCode::ParseError,
                        format!("invalid stdio frame: {reason}"),
                    );
                    (Some(reply), framing)
                }
                Inbound::Message { body, framing } => {
                    let reply = match serde_json::from_slice::<JsonRpcRequest>(&body) {
                        Ok(request) => self.handle_request(request),
                        Err(err) => Some(JsonRpcResponse::failure(
                            Value::Null,
                            ErrorCode::ParseError,
                            format!("parse error: {err}"),
                        )),
                    };
                    (reply, framing)
                }
            };
            if let Some(reply) = reply {
                write_message(writer, framing, &reply)?;
            }
        }
        Ok(())
    }
}

fn input_error_result(id: Value, err: &InputError) -> JsonRpcResponse {
    let detail = match err {
        InputError::Missing(fields) => json!({
            "kind": "missing_input",
            "fields": fields
        }),
        InputError::CountryNotFound(country) => json!({
            "kind": "country_not_found",
            "country": country
        }),
        InputError::OutOfRange { field, value } => json!({
            "kind": "out_of_range",
            "field": field,
            "value": value
        }),
    };
    JsonRpcResponse::tool_error(id, err.to_string(), detail)
}

fn tools_list_result() -> Value {
    json!({
        "tools": [
            {
                "name": "scr_simulate",
                "description": "Score a supplier's supply chain resilience, rank it against the portfolio and compute the KPI values needed to reach the next strength tier.",
                "inputSchema": {
                    "type": "object",
                    "required": ["lead_time_days", "distance_km", "bcp_risk", "country"],
                    "properties": {
                        "lead_time_days": {"type": "number", "minimum": 0},
                        "distance_km": {"type": "number", "minimum": 0},
                        "bcp_risk": {"type": "string", "enum": ["LOW", "MEDIUM", "HIGH"]},
                        "country": {"type": "string"}
                    }
                }
            },
            {
                "name": "scr_country_risk",
                "description": "Look up fragility index and natural disaster risk for a supplier country.",
                "inputSchema": {
                    "type": "object",
                    "required": ["country"],
                    "properties": {
                        "country": {"type": "string"}
                    }
                }
            },
            {
                "name": "scr_profile",
                "description": "Show the KPI weights and tier thresholds in use.",
                "inputSchema": {
                    "type": "object",
                    "properties": {}
                }
            }
        ]
    })
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    let Some(args) = arguments else {
        return Err(JsonRpcResponse::failure(
            Value::Null,
            ErrorCode::InvalidParams,
            "missing tool arguments",
        ));
    };

    serde_json::from_value(args).map_err(|err| {
        JsonRpcResponse::failure(
            Value::Null,
            ErrorCode::InvalidParams,
            format!("invalid tool arguments: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use scr_core::{BcpRisk, KpiRow, ReferencePopulation, ScoringProfile};

    use super::*;
    use crate::transport::MAX_FRAME_BYTES;

    fn server() -> SimulatorServer {
        let row = |lead, dist, frag, nat| KpiRow {
            lead_time_days: lead,
            distance_km: dist,
            bcp_risk: BcpRisk::Low,
            fragility_index: frag,
            natural_disaster_risk_pct: nat,
        };
        let population = ReferencePopulation::new(vec![
            row(21.0, 800.0, 24.6, 3.92),
            row(35.0, 1200.0, 41.9, 5.78),
        ])
        .unwrap();
        SimulatorServer::new(
            Evaluator::new(ScoringProfile::default()).unwrap(),
            Box::new(InMemoryReference::new(population)),
            CountryRiskTable::default(),
        )
    }

    fn serve_bytes(input: &[u8]) -> String {
        let mut out = Vec::new();
        server().serve(Cursor::new(input.to_vec()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Splits a header-framed reply off the front of `output`.
    fn take_frame(output: &str) -> (Value, &str) {
        let (header, rest) = output.split_once("\r\n\r\n").unwrap();
        let len: usize = header
            .strip_prefix("Content-Length: ")
            .unwrap()
            .parse()
            .unwrap();
        let (body, rest) = rest.split_at(len);
        (serde_json::from_str(body).unwrap(), rest)
    }

    #[test]
    fn huge_content_length_gets_parse_error_without_allocating() {
        let output = serve_bytes(b"Content-Length: 18446744073709551615\r\n\r\n{}\n");
        let (reply, rest) = take_frame(&output);
        assert_eq!(reply["error"]["code"].as_i64(), Some(ErrorCode::ParseError.code()));
        assert!(reply["error"]["message"]
            .as_str()
            .unwrap()
            .contains("exceeds"));
        assert!(rest.is_empty());
    }

    #[test]
    fn server_keeps_answering_after_an_oversized_frame() {
        let mut input = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_BYTES + 1).into_bytes();
        input.extend(std::iter::repeat(b'x').take(MAX_FRAME_BYTES + 1));
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}\n");
        let output = serve_bytes(&input);

        let (rejected, rest) = take_frame(&output);
        assert_eq!(rejected["error"]["code"].as_i64(), Some(ErrorCode::ParseError.code()));
        let ping: Value = serde_json::from_str(rest.trim_end()).unwrap();
        assert_eq!(ping["id"], 9);
        assert!(ping["result"].is_object());
    }

    #[test]
    fn garbage_line_is_a_parse_error() {
        let output = serve_bytes(b"not json\n");
        let reply: Value = serde_json::from_str(output.trim_end()).unwrap();
        assert_eq!(reply["error"]["code"].as_i64(), Some(-32700));
        assert_eq!(reply["id"], Value::Null);
    }

    #[test]
    fn missing_arguments_are_invalid_params() {
        let err = parse_args::<KpiInput>(None).unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::InvalidParams.code()));
    }
}
