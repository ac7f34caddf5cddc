use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::Method;
use serde_json::json;
use strutrouter::{Contract, DispatcherConfig, OperationDispatcher, RequestContext};

fn example_contract() -> &'static str {
    r#"
securityDefinitions:
  key: { type: apiKey, in: header, name: X-Api-Key }
paths:
  /zoo/animals:
    get: { operationId: get_animals }
    post:
      operationId: create_animal
      parameters:
        - name: animal
          in: body
          schema:
            type: object
            required: [name]
            properties:
              name: { type: string, minLength: 1 }
              born: { type: string }
        - { name: born, in: formData, type: string, format: date }
  /zoo/animals/{id}:
    get:
      operationId: get_animal
      security: [ { key: [] } ]
      parameters:
        - { name: id, in: path, type: integer, required: true, minimum: 1 }
  /zoo/animals/{id}/toys/{toy_id}:
    get: { operationId: animal_toy }
  /zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}:
    get: { operationId: habitat_section }
  /inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}:
    post: { operationId: post_item_batch }
  /complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}:
    get: { operationId: complex_many_params }
"#
}

fn dispatcher() -> OperationDispatcher {
    let contract = Contract::from_yaml_str(example_contract()).expect("failed to parse contract");
    let mut builder = DispatcherConfig::builder().security_handler(
        "key",
        |_: &mut RequestContext, key: Option<&str>| -> anyhow::Result<bool> { Ok(key.is_some()) },
    );
    for (_, _, op) in contract.operations() {
        let id = op.operation_id.clone().unwrap_or_default();
        builder = builder.operation(id, |ctx: &mut RequestContext| -> anyhow::Result<()> {
            ctx.body = Some(json!({"ok": true}));
            Ok(())
        });
    }
    OperationDispatcher::compile(contract, builder.build()).expect("failed to compile contract")
}

fn bench_route_match(c: &mut Criterion) {
    let dispatcher = dispatcher();
    let router = dispatcher.router();
    c.bench_function("route_match", |b| {
        let test_paths = [
            "/zoo/animals/123",
            "/zoo/animals/123/toys/456",
            "/zoo/cats/animals/123/habitats/88/sections/5",
            "/inventory/1/feeds/2/items/3/batches/4",
            "/complex/1/2/3/4/5/6/7/8/9",
        ];
        b.iter(|| {
            for path in test_paths.iter() {
                let res = router.route(path);
                black_box(&res);
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = dispatcher();

    c.bench_function("dispatch_secured_get", |b| {
        b.iter(|| {
            let mut ctx = RequestContext::new(Method::GET, "/zoo/animals/42").with_header("X-Api-Key", "k");
            black_box(dispatcher.handle(&mut ctx));
        })
    });

    c.bench_function("dispatch_validated_post", |b| {
        b.iter(|| {
            let mut ctx = RequestContext::new(Method::POST, "/zoo/animals")
                .with_json_body(json!({"name": "zebra", "born": "2020-02-29"}));
            black_box(dispatcher.handle(&mut ctx));
        })
    });
}

criterion_group!(benches, bench_route_match, bench_dispatch);
criterion_main!(benches);
